//! Named field accessors on immutable records.
use std::fmt;

/// A named part of a record of type `T`, with a value of type `V`.
///
/// Reading projects the value out of a snapshot. Writing never mutates: it builds a new snapshot with
/// the field replaced, which is how forms turn a single edited value back into a whole record.
///
/// Use the [`field!`](crate::field!) macro to build one for a struct field.
pub struct Field<T, V> {
    name: &'static str,
    get: fn(&T) -> V,
    set: fn(&T, V) -> T,
}

// #26925 impl
impl<T, V> Clone for Field<T, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, V> Copy for Field<T, V> {}

impl<T, V> fmt::Debug for Field<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Field").field(&self.name).finish()
    }
}

impl<T, V> Field<T, V> {
    pub const fn new(name: &'static str, get: fn(&T) -> V, set: fn(&T, V) -> T) -> Field<T, V> {
        Field { name, get, set }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the value of the field in `data`.
    pub fn get(&self, data: &T) -> V {
        (self.get)(data)
    }

    /// Returns a new record equal to `data` except for this field, which is set to `value`.
    pub fn set(&self, data: &T, value: V) -> T {
        (self.set)(data, value)
    }
}

/// Builds a [`Field`] for a field of a `Clone` struct held in an `Rc`.
///
/// ```
/// use std::rc::Rc;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// let name = fanix::field!(Person, name);
/// let bob = Rc::new(Person { name: "Bob".into(), age: 42 });
/// let alice = name.set(&bob, "Alice".to_string());
/// assert_eq!(name.get(&alice), "Alice");
/// assert_eq!(alice.age, 42);
/// assert_eq!(bob.name, "Bob");
/// ```
#[macro_export]
macro_rules! field {
    ($ty:ty, $field:ident) => {
        $crate::Field::new(
            ::std::stringify!($field),
            |data: &::std::rc::Rc<$ty>| ::std::clone::Clone::clone(&data.$field),
            |data: &::std::rc::Rc<$ty>, value| {
                let mut new: $ty = ::std::clone::Clone::clone(&**data);
                new.$field = value;
                ::std::rc::Rc::new(new)
            },
        )
    };
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    #[derive(Clone, Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn set_builds_a_new_snapshot() {
        let x = crate::field!(Point, x);
        let p = Rc::new(Point { x: 1, y: 2 });
        let q = x.set(&p, 10);
        assert_eq!(*q, Point { x: 10, y: 2 });
        assert_eq!(p.x, 1);
        assert!(!Rc::ptr_eq(&p, &q));
        assert_eq!(x.get(&q), 10);
        assert_eq!(x.name(), "x");
    }
}
