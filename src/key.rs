//! Cache keys derived from call arguments.
//!
//! ## Architecture
//!
//! ```text
//!   receiver ──► Receiver (pointer identity, keeps the Arc alive)
//!   args     ──► CallArgs::positional ──► Vec<Frozen>
//!            └─► CallArgs::keywords   ──► BTreeMap<String, Frozen>
//!                                             │
//!                                             ▼
//!                                   CallKey { receiver, positional, keywords }
//! ```
//!
//! [`Frozen`] is a recursive immutable value tree used purely for equality
//! and hashing; it is never handed to the memoized callable. Mappings freeze
//! to order-independent sets of key/value pairs and sequences to ordered
//! sequences, so two calls with structurally equal arguments produce equal,
//! same-hash keys no matter which collection instances (or `HashMap`
//! iteration orders) they came from.
//!
//! ## Example
//!
//! ```
//! use std::collections::HashMap;
//!
//! use memokit::key::{Args, CallKey};
//!
//! let mut a = HashMap::new();
//! a.insert("x", vec![1, 2]);
//! a.insert("y", vec![3]);
//!
//! let mut b = HashMap::new();
//! b.insert("y", vec![3]);
//! b.insert("x", vec![1, 2]);
//!
//! let k1 = CallKey::unbound(&Args::new().arg("load").kwarg("opts", &a));
//! let k2 = CallKey::unbound(&Args::new().arg("load").kwarg("opts", &b));
//! assert_eq!(k1, k2);
//! ```

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Frozen
// ---------------------------------------------------------------------------

/// Immutable, hashable, totally ordered representation of an argument.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Frozen {
    Unit,
    /// An absent optional value.
    Nothing,
    /// A present optional value.
    Just(Box<Frozen>),
    Bool(bool),
    Int(i128),
    /// Unsigned integers above `i128::MAX`; smaller ones freeze to `Int`.
    WideUint(u128),
    /// IEEE-754 bit pattern; `-0.0` is folded into `0.0`.
    Float(u64),
    Char(char),
    Str(String),
    Bytes(Vec<u8>),
    Seq(Vec<Frozen>),
    Set(BTreeSet<Frozen>),
    Map(BTreeSet<(Frozen, Frozen)>),
}

impl Frozen {
    /// Freezes a float, normalising negative zero.
    pub fn float(value: f64) -> Self {
        if value == 0.0 {
            Frozen::Float(0.0f64.to_bits())
        } else {
            Frozen::Float(value.to_bits())
        }
    }

    /// Builds a frozen mapping from key/value pairs in any order.
    pub fn map<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Frozen, Frozen)>,
    {
        Frozen::Map(pairs.into_iter().collect())
    }

    /// Returns the integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Frozen::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string payload, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Frozen::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the float payload, if this is a `Float`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Frozen::Float(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Freeze
// ---------------------------------------------------------------------------

/// Conversion of an argument value into its [`Frozen`] form.
pub trait Freeze {
    fn freeze(&self) -> Frozen;
}

impl Freeze for Frozen {
    fn freeze(&self) -> Frozen {
        self.clone()
    }
}

impl Freeze for () {
    fn freeze(&self) -> Frozen {
        Frozen::Unit
    }
}

impl Freeze for bool {
    fn freeze(&self) -> Frozen {
        Frozen::Bool(*self)
    }
}

impl Freeze for char {
    fn freeze(&self) -> Frozen {
        Frozen::Char(*self)
    }
}

macro_rules! freeze_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl Freeze for $t {
                #[inline]
                fn freeze(&self) -> Frozen {
                    Frozen::Int(*self as i128)
                }
            }
        )*
    };
}

freeze_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, i128);

impl Freeze for u128 {
    fn freeze(&self) -> Frozen {
        i128::try_from(*self).map_or(Frozen::WideUint(*self), Frozen::Int)
    }
}

impl Freeze for f32 {
    fn freeze(&self) -> Frozen {
        Frozen::float(f64::from(*self))
    }
}

impl Freeze for f64 {
    fn freeze(&self) -> Frozen {
        Frozen::float(*self)
    }
}

impl Freeze for str {
    fn freeze(&self) -> Frozen {
        Frozen::Str(self.to_owned())
    }
}

impl Freeze for String {
    fn freeze(&self) -> Frozen {
        Frozen::Str(self.clone())
    }
}

impl<T: Freeze + ?Sized> Freeze for &T {
    fn freeze(&self) -> Frozen {
        (**self).freeze()
    }
}

impl<T: Freeze + ?Sized> Freeze for Box<T> {
    fn freeze(&self) -> Frozen {
        (**self).freeze()
    }
}

impl<T: Freeze + ?Sized> Freeze for Arc<T> {
    fn freeze(&self) -> Frozen {
        (**self).freeze()
    }
}

impl<T: Freeze + ?Sized> Freeze for Rc<T> {
    fn freeze(&self) -> Frozen {
        (**self).freeze()
    }
}

impl<T: Freeze> Freeze for Option<T> {
    fn freeze(&self) -> Frozen {
        match self {
            None => Frozen::Nothing,
            Some(v) => Frozen::Just(Box::new(v.freeze())),
        }
    }
}

impl<T: Freeze> Freeze for [T] {
    fn freeze(&self) -> Frozen {
        Frozen::Seq(self.iter().map(Freeze::freeze).collect())
    }
}

impl<T: Freeze, const N: usize> Freeze for [T; N] {
    fn freeze(&self) -> Frozen {
        self.as_slice().freeze()
    }
}

impl<T: Freeze> Freeze for Vec<T> {
    fn freeze(&self) -> Frozen {
        self.as_slice().freeze()
    }
}

impl<T: Freeze> Freeze for VecDeque<T> {
    fn freeze(&self) -> Frozen {
        Frozen::Seq(self.iter().map(Freeze::freeze).collect())
    }
}

impl<T: Freeze, S> Freeze for HashSet<T, S> {
    fn freeze(&self) -> Frozen {
        Frozen::Set(self.iter().map(Freeze::freeze).collect())
    }
}

impl<T: Freeze> Freeze for BTreeSet<T> {
    fn freeze(&self) -> Frozen {
        Frozen::Set(self.iter().map(Freeze::freeze).collect())
    }
}

impl<K: Freeze, V: Freeze, S> Freeze for HashMap<K, V, S> {
    fn freeze(&self) -> Frozen {
        Frozen::map(self.iter().map(|(k, v)| (k.freeze(), v.freeze())))
    }
}

impl<K: Freeze, V: Freeze> Freeze for BTreeMap<K, V> {
    fn freeze(&self) -> Frozen {
        Frozen::map(self.iter().map(|(k, v)| (k.freeze(), v.freeze())))
    }
}

macro_rules! freeze_tuple {
    ($($name:ident),+) => {
        impl<$($name: Freeze),+> Freeze for ($($name,)+) {
            #[allow(non_snake_case)]
            fn freeze(&self) -> Frozen {
                let ($($name,)+) = self;
                Frozen::Seq(vec![$($name.freeze()),+])
            }
        }
    };
}

freeze_tuple!(A);
freeze_tuple!(A, B);
freeze_tuple!(A, B, C);
freeze_tuple!(A, B, C, D);
freeze_tuple!(A, B, C, D, F);
freeze_tuple!(A, B, C, D, F, G);
freeze_tuple!(A, B, C, D, F, G, H);
freeze_tuple!(A, B, C, D, F, G, H, I);

// ---------------------------------------------------------------------------
// CallArgs
// ---------------------------------------------------------------------------

/// Splits a call's arguments into positional and keyword parts.
///
/// Tuples are purely positional: `(a, b)` freezes to positional `[a, b]`.
/// Use [`Args`] when keyword arguments are needed.
pub trait CallArgs {
    fn positional(&self) -> Vec<Frozen>;

    fn keywords(&self) -> BTreeMap<String, Frozen> {
        BTreeMap::new()
    }
}

impl CallArgs for () {
    fn positional(&self) -> Vec<Frozen> {
        Vec::new()
    }
}

impl<T: CallArgs + ?Sized> CallArgs for &T {
    fn positional(&self) -> Vec<Frozen> {
        (**self).positional()
    }

    fn keywords(&self) -> BTreeMap<String, Frozen> {
        (**self).keywords()
    }
}

macro_rules! call_args_tuple {
    ($($name:ident),+) => {
        impl<$($name: Freeze),+> CallArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn positional(&self) -> Vec<Frozen> {
                let ($($name,)+) = self;
                vec![$($name.freeze()),+]
            }
        }
    };
}

call_args_tuple!(A);
call_args_tuple!(A, B);
call_args_tuple!(A, B, C);
call_args_tuple!(A, B, C, D);
call_args_tuple!(A, B, C, D, F);
call_args_tuple!(A, B, C, D, F, G);
call_args_tuple!(A, B, C, D, F, G, H);
call_args_tuple!(A, B, C, D, F, G, H, I);

/// Dynamic argument bag with positional and keyword arguments.
///
/// ```
/// use memokit::key::{Args, CallArgs, Frozen};
///
/// let args = Args::new().arg(3).kwarg("scale", 2.5);
/// assert_eq!(args.get(0), Some(&Frozen::Int(3)));
/// assert_eq!(args.kw("scale").and_then(Frozen::as_f64), Some(2.5));
/// assert_eq!(args.positional().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Args {
    positional: Vec<Frozen>,
    keywords: BTreeMap<String, Frozen>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Freeze) -> Self {
        self.positional.push(value.freeze());
        self
    }

    /// Sets a keyword argument, replacing any previous value for `name`.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Freeze) -> Self {
        self.keywords.insert(name.into(), value.freeze());
        self
    }

    pub fn get(&self, index: usize) -> Option<&Frozen> {
        self.positional.get(index)
    }

    pub fn kw(&self, name: &str) -> Option<&Frozen> {
        self.keywords.get(name)
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CallArgs for Args {
    fn positional(&self) -> Vec<Frozen> {
        self.positional.clone()
    }

    fn keywords(&self) -> BTreeMap<String, Frozen> {
        self.keywords.clone()
    }
}

// ---------------------------------------------------------------------------
// Receiver
// ---------------------------------------------------------------------------

/// Identity of the object a method call is bound to.
///
/// Two receivers are equal only if they point at the same allocation. The
/// receiver is kept alive for as long as any key refers to it, so its
/// address cannot be reused by another object while the key exists.
#[derive(Clone)]
pub struct Receiver(Arc<dyn Any + Send + Sync>);

impl Receiver {
    pub fn new<T: Any + Send + Sync>(receiver: &Arc<T>) -> Self {
        Receiver(Arc::clone(receiver) as Arc<dyn Any + Send + Sync>)
    }

    #[inline]
    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Whether this receiver is `other`.
    pub fn is<T: Any + Send + Sync>(&self, other: &Arc<T>) -> bool {
        self.addr() == Arc::as_ptr(other) as *const () as usize
    }
}

impl PartialEq for Receiver {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for Receiver {}

impl Hash for Receiver {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Receiver({:#x})", self.addr())
    }
}

// ---------------------------------------------------------------------------
// CallKey
// ---------------------------------------------------------------------------

/// Normalized key for one call: receiver, positional and keyword arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallKey {
    receiver: Option<Receiver>,
    positional: Vec<Frozen>,
    keywords: BTreeMap<String, Frozen>,
}

impl CallKey {
    /// Key for a call that is not bound to a receiver.
    pub fn unbound<A: CallArgs + ?Sized>(args: &A) -> Self {
        Self {
            receiver: None,
            positional: args.positional(),
            keywords: args.keywords(),
        }
    }

    /// Key for a call bound to `receiver`.
    pub fn bound<A: CallArgs + ?Sized>(receiver: Receiver, args: &A) -> Self {
        Self {
            receiver: Some(receiver),
            positional: args.positional(),
            keywords: args.keywords(),
        }
    }

    pub fn receiver(&self) -> Option<&Receiver> {
        self.receiver.as_ref()
    }

    pub fn positional(&self) -> &[Frozen] {
        &self.positional
    }

    pub fn keywords(&self) -> &BTreeMap<String, Frozen> {
        &self.keywords
    }
}
