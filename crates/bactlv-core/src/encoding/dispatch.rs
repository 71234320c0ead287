use crate::encoding::reader::ReadBuffer;
use crate::encoding::tag::TagHeader;
use crate::DecodeError;
use std::fmt;

/// Parser for one variant of a choice, given the caller's arguments.
pub type VariantParser<T, A> = fn(&mut ReadBuffer<'_>, &A) -> Result<T, DecodeError>;

/// A discriminator value a [`DispatchTable`] can be keyed on.
pub trait DispatchKey: Copy + PartialEq + fmt::Debug {
    /// The raw observed value, reported when nothing matches.
    fn raw(&self) -> u64;

    /// A less specific key to retry with when this one has no entry.
    fn widen(&self) -> Option<Self> {
        None
    }
}

impl DispatchKey for u8 {
    fn raw(&self) -> u64 {
        u64::from(*self)
    }
}

impl DispatchKey for u32 {
    fn raw(&self) -> u64 {
        u64::from(*self)
    }
}

/// Immutable mapping from discriminator to variant parser.
pub struct DispatchTable<K: 'static, T: 'static, A: 'static> {
    choice: &'static str,
    entries: &'static [(K, VariantParser<T, A>)],
    otherwise: Option<VariantParser<T, A>>,
}

impl<K, T, A> DispatchTable<K, T, A>
where
    K: DispatchKey + 'static,
    T: 'static,
    A: 'static,
{
    pub const fn new(choice: &'static str, entries: &'static [(K, VariantParser<T, A>)]) -> Self {
        Self {
            choice,
            entries,
            otherwise: None,
        }
    }

    /// Adds a branch taken when no entry matches.
    pub const fn with_otherwise(self, otherwise: VariantParser<T, A>) -> Self {
        Self {
            choice: self.choice,
            entries: self.entries,
            otherwise: Some(otherwise),
        }
    }

    pub const fn choice(&self) -> &'static str {
        self.choice
    }

    fn lookup(&self, key: K) -> Option<VariantParser<T, A>> {
        let mut candidate = Some(key);
        while let Some(k) = candidate {
            if let Some((_, parser)) = self.entries.iter().find(|(entry, _)| *entry == k) {
                return Some(*parser);
            }
            candidate = k.widen();
        }
        None
    }

    pub fn contains(&self, key: K) -> bool {
        self.lookup(key).is_some()
    }

    /// Picks the parser for `key`, falling back through widened keys and
    /// then the `otherwise` branch.
    pub fn resolve(&self, r: &ReadBuffer<'_>, key: K) -> Result<VariantParser<T, A>, DecodeError> {
        if let Some(parser) = self.lookup(key) {
            log::trace!("{}: selected variant for {key:?}", self.choice);
            return Ok(parser);
        }
        if let Some(parser) = self.otherwise {
            log::trace!("{}: no variant for {key:?}, using fallback", self.choice);
            return Ok(parser);
        }
        log::debug!(
            "{}: unmapped discriminator {key:?} at byte {}",
            self.choice,
            r.pos().byte_offset()
        );
        Err(DecodeError::UnknownVariant {
            choice: self.choice,
            value: key.raw(),
            offset: r.pos().byte_offset(),
        })
    }

    /// Resolves `key` and runs the selected parser. Nothing is consumed when
    /// the key is unmapped.
    pub fn dispatch(&self, r: &mut ReadBuffer<'_>, key: K, args: &A) -> Result<T, DecodeError> {
        let parser = self.resolve(r, key)?;
        parser(r, args).map_err(|e| e.in_field(self.choice))
    }
}

impl<K: fmt::Debug + 'static, T: 'static, A: 'static> fmt::Debug for DispatchTable<K, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("choice", &self.choice)
            .field(
                "keys",
                &self.entries.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            )
            .field("otherwise", &self.otherwise.is_some())
            .finish()
    }
}

/// Peeks the next tag header and dispatches on its tag number.
pub fn dispatch_on_peeked_tag<T: 'static, A: 'static>(
    r: &mut ReadBuffer<'_>,
    table: &DispatchTable<u8, T, A>,
    args: &A,
) -> Result<T, DecodeError> {
    let header = TagHeader::peek(r)?;
    table.dispatch(r, header.actual_tag_number(), args)
}

#[cfg(test)]
mod tests {
    use super::{dispatch_on_peeked_tag, DispatchKey, DispatchTable, VariantParser};
    use crate::encoding::reader::ReadBuffer;
    use crate::{DecodeError, ErrorKind};

    #[derive(Debug, PartialEq)]
    enum Shape {
        Small(u8),
        Large(u8),
        Other,
    }

    fn small(r: &mut ReadBuffer<'_>, _: &()) -> Result<Shape, DecodeError> {
        r.read_u8(8)?;
        Ok(Shape::Small(r.read_u8(8)?))
    }

    fn large(r: &mut ReadBuffer<'_>, _: &()) -> Result<Shape, DecodeError> {
        r.read_u8(8)?;
        Ok(Shape::Large(r.read_u8(8)?))
    }

    fn other(r: &mut ReadBuffer<'_>, _: &()) -> Result<Shape, DecodeError> {
        r.skip_bytes(r.remaining_bytes())?;
        Ok(Shape::Other)
    }

    static SHAPES: [(u8, VariantParser<Shape, ()>); 2] = [(0, small), (1, large)];
    static SHAPE_TABLE: DispatchTable<u8, Shape, ()> = DispatchTable::new("Shape", &SHAPES);
    static SHAPE_TABLE_WITH_FALLBACK: DispatchTable<u8, Shape, ()> =
        DispatchTable::new("Shape", &SHAPES).with_otherwise(other);

    #[test]
    fn dispatches_on_peeked_tag_number() {
        let mut r = ReadBuffer::new(&[0x09, 0x05]);
        assert_eq!(
            dispatch_on_peeked_tag(&mut r, &SHAPE_TABLE, &()).unwrap(),
            Shape::Small(5)
        );
        let mut r = ReadBuffer::new(&[0x19, 0x06]);
        assert_eq!(
            dispatch_on_peeked_tag(&mut r, &SHAPE_TABLE, &()).unwrap(),
            Shape::Large(6)
        );
    }

    #[test]
    fn unknown_discriminator_consumes_nothing() {
        let mut r = ReadBuffer::new(&[0xAA, 0x3C, 0x00]);
        r.read_u8(8).unwrap();
        let err = dispatch_on_peeked_tag(&mut r, &SHAPE_TABLE, &()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownVariant {
                choice: "Shape",
                value: 3,
                offset: 1
            }
        );
        assert_eq!(r.pos().byte_offset(), 1);
    }

    #[test]
    fn otherwise_branch_catches_unmapped_keys() {
        let mut r = ReadBuffer::new(&[0x3C, 0x00]);
        assert_eq!(
            dispatch_on_peeked_tag(&mut r, &SHAPE_TABLE_WITH_FALLBACK, &()).unwrap(),
            Shape::Other
        );
        assert!(!SHAPE_TABLE.contains(3));
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Scoped {
        scope: Option<u8>,
        id: u8,
    }

    impl DispatchKey for Scoped {
        fn raw(&self) -> u64 {
            u64::from(self.id)
        }

        fn widen(&self) -> Option<Self> {
            self.scope.map(|_| Self {
                scope: None,
                id: self.id,
            })
        }
    }

    fn scoped(_: &mut ReadBuffer<'_>, _: &()) -> Result<&'static str, DecodeError> {
        Ok("scoped")
    }

    fn generic(_: &mut ReadBuffer<'_>, _: &()) -> Result<&'static str, DecodeError> {
        Ok("generic")
    }

    static SCOPED: [(Scoped, VariantParser<&'static str, ()>); 2] = [
        (
            Scoped {
                scope: Some(1),
                id: 7,
            },
            scoped,
        ),
        (Scoped { scope: None, id: 7 }, generic),
    ];
    static SCOPED_TABLE: DispatchTable<Scoped, &'static str, ()> =
        DispatchTable::new("Scoped", &SCOPED);

    #[test]
    fn keys_widen_before_failing() {
        let mut r = ReadBuffer::new(&[]);
        let key = |scope| Scoped { scope, id: 7 };
        assert_eq!(SCOPED_TABLE.dispatch(&mut r, key(Some(1)), &()).unwrap(), "scoped");
        assert_eq!(SCOPED_TABLE.dispatch(&mut r, key(Some(2)), &()).unwrap(), "generic");
        let err = SCOPED_TABLE
            .dispatch(&mut r, Scoped { scope: None, id: 8 }, &())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownVariant);
    }
}
