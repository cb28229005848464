//! Key parts for memoized calls.
//!
//! Owned values are matched by equality and held strongly. Reference-counted
//! allocations are matched by address and held weakly, so a key never keeps
//! the object it names alive.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{self, Rc};
use std::sync::{self, Arc};

const CANONICAL_NAN: u64 = 0x7ff8_0000_0000_0000;

/// A value-keyed part: matched by equality, held strongly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    /// `()` and `None`
    Unit,
    /// Boolean
    Bool(bool),
    /// Any integer, widened
    Int(i128),
    /// Normalized float bit pattern, see [`ValueKey::float`]
    Float(u64),
    /// Character
    Char(char),
    /// Owned string
    Str(Box<str>),
    /// Static name, used for operation tags
    Symbol(&'static str),
    /// Type tag
    Type(TypeId),
}

impl ValueKey {
    /// Key a float so that `0.0 == -0.0` and every NaN matches every other NaN.
    #[must_use]
    pub fn float(value: f64) -> Self {
        let bits = if value.is_nan() {
            CANONICAL_NAN
        } else if value == 0.0 {
            0
        } else {
            value.to_bits()
        };
        Self::Float(bits)
    }
}

impl fmt::Display for ValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => write!(f, "()"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Self::Char(c) => write!(f, "{:?}", c),
            Self::Str(s) => write!(f, "{:?}", s),
            Self::Symbol(name) => write!(f, "#{}", name),
            Self::Type(id) => write!(f, "{:?}", id),
        }
    }
}

trait Liveness {
    fn is_alive(&self) -> bool;
}

impl<T: ?Sized> Liveness for rc::Weak<T> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

impl<T: ?Sized> Liveness for sync::Weak<T> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

/// An identity-keyed part: the address of a shared allocation.
///
/// The key holds a weak pointer to the allocation. That keeps the memory
/// block (not the value) reserved, so the address cannot be handed to a
/// different object while this key exists.
#[derive(Clone)]
pub struct RefKey {
    addr: usize,
    probe: Rc<dyn Liveness>,
}

impl RefKey {
    /// Identity of an `Rc` allocation
    #[must_use]
    pub fn of_rc<T: ?Sized + 'static>(value: &Rc<T>) -> Self {
        Self {
            addr: Rc::as_ptr(value).cast::<()>() as usize,
            probe: Rc::new(Rc::downgrade(value)),
        }
    }

    /// Identity of an `Arc` allocation
    #[must_use]
    pub fn of_arc<T: ?Sized + 'static>(value: &Arc<T>) -> Self {
        Self {
            addr: Arc::as_ptr(value).cast::<()>() as usize,
            probe: Rc::new(Arc::downgrade(value)),
        }
    }

    /// Address the key matches on
    #[must_use]
    pub const fn addr(&self) -> usize {
        self.addr
    }

    /// Whether the target is still strongly reachable
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.probe.is_alive()
    }
}

impl PartialEq for RefKey {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl Eq for RefKey {}

impl Hash for RefKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr.hash(state);
    }
}

impl fmt::Debug for RefKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefKey")
            .field("addr", &format_args!("{:#x}", self.addr))
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// One component of a key sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    /// Matched by equality, held strongly
    Value(ValueKey),
    /// Matched by identity, held weakly
    Ref(RefKey),
}

impl KeyPart {
    /// A static name
    #[must_use]
    pub const fn symbol(name: &'static str) -> Self {
        Self::Value(ValueKey::Symbol(name))
    }

    /// A type tag
    #[must_use]
    pub fn type_of<T: ?Sized + 'static>() -> Self {
        Self::Value(ValueKey::Type(TypeId::of::<T>()))
    }

    /// Reference identity of `value`
    #[must_use]
    pub fn identity<T: ?Sized + 'static>(value: &Rc<T>) -> Self {
        Self::Ref(RefKey::of_rc(value))
    }

    /// Whether this part is matched by reference identity (and held weakly).
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        matches!(self, Self::Ref(_))
    }

    /// Value parts are always alive; identity parts while their target is.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        match self {
            Self::Value(_) => true,
            Self::Ref(key) => key.is_alive(),
        }
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => fmt::Display::fmt(value, f),
            Self::Ref(key) => write!(f, "@{:#x}", key.addr),
        }
    }
}

impl From<ValueKey> for KeyPart {
    fn from(value: ValueKey) -> Self {
        Self::Value(value)
    }
}

impl From<RefKey> for KeyPart {
    fn from(key: RefKey) -> Self {
        Self::Ref(key)
    }
}

/// A static name usable as an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(pub &'static str);

/// Conversion of a single argument into a [`KeyPart`].
pub trait ToKeyPart {
    /// The key part this argument is matched on
    fn key_part(&self) -> KeyPart;
}

macro_rules! int_key_part {
    ($($ty:ty)*) => {
        $(
            impl ToKeyPart for $ty {
                fn key_part(&self) -> KeyPart {
                    KeyPart::Value(ValueKey::Int(*self as i128))
                }
            }
        )*
    };
}

int_key_part!(i8 i16 i32 i64 i128 isize u8 u16 u32 u64 usize);

impl ToKeyPart for f64 {
    fn key_part(&self) -> KeyPart {
        KeyPart::Value(ValueKey::float(*self))
    }
}

impl ToKeyPart for f32 {
    fn key_part(&self) -> KeyPart {
        KeyPart::Value(ValueKey::float(f64::from(*self)))
    }
}

impl ToKeyPart for bool {
    fn key_part(&self) -> KeyPart {
        KeyPart::Value(ValueKey::Bool(*self))
    }
}

impl ToKeyPart for char {
    fn key_part(&self) -> KeyPart {
        KeyPart::Value(ValueKey::Char(*self))
    }
}

impl ToKeyPart for () {
    fn key_part(&self) -> KeyPart {
        KeyPart::Value(ValueKey::Unit)
    }
}

impl ToKeyPart for str {
    fn key_part(&self) -> KeyPart {
        KeyPart::Value(ValueKey::Str(self.into()))
    }
}

impl ToKeyPart for String {
    fn key_part(&self) -> KeyPart {
        self.as_str().key_part()
    }
}

impl ToKeyPart for Symbol {
    fn key_part(&self) -> KeyPart {
        KeyPart::symbol(self.0)
    }
}

impl ToKeyPart for KeyPart {
    fn key_part(&self) -> KeyPart {
        self.clone()
    }
}

impl<T: ToKeyPart> ToKeyPart for Option<T> {
    fn key_part(&self) -> KeyPart {
        match self {
            Some(value) => value.key_part(),
            None => KeyPart::Value(ValueKey::Unit),
        }
    }
}

impl<T: ToKeyPart + ?Sized> ToKeyPart for &T {
    fn key_part(&self) -> KeyPart {
        (**self).key_part()
    }
}

impl<T: ?Sized + 'static> ToKeyPart for Rc<T> {
    fn key_part(&self) -> KeyPart {
        KeyPart::Ref(RefKey::of_rc(self))
    }
}

impl<T: ?Sized + 'static> ToKeyPart for Arc<T> {
    fn key_part(&self) -> KeyPart {
        KeyPart::Ref(RefKey::of_arc(self))
    }
}

/// Conversion of a whole argument list into positional key parts.
pub trait KeyArgs {
    /// Append one key part per argument position, in order.
    fn push_key_parts(&self, out: &mut Vec<KeyPart>);

    /// Full key sequence for calling `target` with these arguments.
    fn key_sequence(&self, target: KeyPart) -> Vec<KeyPart> {
        let mut key = vec![target];
        self.push_key_parts(&mut key);
        key
    }
}

impl KeyArgs for () {
    fn push_key_parts(&self, _out: &mut Vec<KeyPart>) {}
}

macro_rules! tuple_key_args {
    ($($name:ident)+) => {
        impl<$($name: ToKeyPart),+> KeyArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn push_key_parts(&self, out: &mut Vec<KeyPart>) {
                let ($($name,)+) = self;
                $(out.push($name.key_part());)+
            }
        }
    };
}

tuple_key_args!(A);
tuple_key_args!(A B);
tuple_key_args!(A B C);
tuple_key_args!(A B C D);
tuple_key_args!(A B C D E);
tuple_key_args!(A B C D E F);
tuple_key_args!(A B C D E F G);
tuple_key_args!(A B C D E F G H);

impl<T: ToKeyPart> KeyArgs for [T] {
    fn push_key_parts(&self, out: &mut Vec<KeyPart>) {
        out.extend(self.iter().map(ToKeyPart::key_part));
    }
}

impl<T: ToKeyPart, const N: usize> KeyArgs for [T; N] {
    fn push_key_parts(&self, out: &mut Vec<KeyPart>) {
        self.as_slice().push_key_parts(out);
    }
}

impl<T: ToKeyPart> KeyArgs for Vec<T> {
    fn push_key_parts(&self, out: &mut Vec<KeyPart>) {
        self.as_slice().push_key_parts(out);
    }
}

impl<T: KeyArgs + ?Sized> KeyArgs for &T {
    fn push_key_parts(&self, out: &mut Vec<KeyPart>) {
        (**self).push_key_parts(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_float_normalization() {
        assert_eq!(ValueKey::float(0.0), ValueKey::float(-0.0));
        assert_eq!(ValueKey::float(f64::NAN), ValueKey::float(-f64::NAN));
        assert_ne!(ValueKey::float(1.0), ValueKey::float(1.5));
    }

    #[test]
    fn test_integer_widths_agree() {
        assert_eq!(7u8.key_part(), 7i64.key_part());
        assert_eq!((-1i32).key_part(), KeyPart::Value(ValueKey::Int(-1)));
    }

    #[test]
    fn test_strings_are_values() {
        let owned = String::from("a");
        assert_eq!(owned.key_part(), "a".key_part());
        assert!(!"a".key_part().is_identity());
    }

    #[test]
    fn test_rc_identity() {
        let a = Rc::new(vec![1, 2]);
        let b = Rc::new(vec![1, 2]);
        assert_eq!(a.key_part(), Rc::clone(&a).key_part());
        assert_ne!(a.key_part(), b.key_part());
        assert!(a.key_part().is_identity());
    }

    #[test]
    fn test_unsized_rc_identity() {
        let a: Rc<str> = Rc::from("same");
        let b: Rc<str> = Rc::from("same");
        assert_ne!(a.key_part(), b.key_part());
    }

    #[test]
    fn test_ref_key_liveness() {
        let a = Rc::new(5);
        let key = a.key_part();
        assert!(key.is_alive());
        drop(a);
        assert!(!key.is_alive());
    }

    #[test]
    fn test_arc_liveness() {
        let a = Arc::new("x");
        let key = a.key_part();
        assert!(key.is_alive());
        drop(a);
        assert!(!key.is_alive());
    }

    #[test]
    fn test_option_none_is_unit() {
        let none: Option<u32> = None;
        assert_eq!(none.key_part(), ().key_part());
        assert_eq!(Some(3u32).key_part(), 3u32.key_part());
    }

    #[test]
    fn test_key_sequence_is_positional() {
        let target = KeyPart::symbol("join");
        let abc = ("a", "b", "c").key_sequence(target.clone());
        let bac = ("b", "a", "c").key_sequence(target.clone());
        assert_ne!(abc, bac);
        assert_eq!(abc[0], target);
        assert_eq!(abc.len(), 4);
    }

    #[test]
    fn test_vec_matches_tuple() {
        let target = KeyPart::symbol("f");
        assert_eq!(
            vec!["a", "c"].key_sequence(target.clone()),
            ("a", "c").key_sequence(target),
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(KeyPart::symbol("wrap").to_string(), "#wrap");
        assert_eq!("a".key_part().to_string(), "\"a\"");
        assert_eq!(42u8.key_part().to_string(), "42");
    }

    proptest! {
        #[test]
        fn prop_int_keys_match_iff_equal(a: i64, b: i64) {
            prop_assert_eq!(a.key_part() == b.key_part(), a == b);
        }

        #[test]
        fn prop_string_keys_match_iff_equal(a: String, b: String) {
            prop_assert_eq!(a.key_part() == b.key_part(), a == b);
        }

        #[test]
        fn prop_finite_float_keys_match_iff_equal(a in -1e9f64..1e9, b in -1e9f64..1e9) {
            prop_assert_eq!(a.key_part() == b.key_part(), a == b);
        }
    }
}
