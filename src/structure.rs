//! Declarative binary layouts
//!
//! A [`Layout`] is an ordered, fixed-width list of [`Field`]s read under one
//! [`Endianness`]. Decoding a buffer against a layout produces a [`Record`] (a mapping
//! from field name to [`Value`]); encoding a record produces exactly
//! [`Layout::byte_width`] bytes.
//!
//! Variable-length data never appears inside a layout: callers slice their buffers
//! before and after decoding, using `byte_width` to know how much a layout consumed.
//!
//! Types with a semantic representation implement [`Structure`], which adds the
//! raw-to-semantic (`from_record`) and semantic-to-raw (`to_record`) conversions on top
//! of a constant layout.
//!
//! ```rust
//! use wifi_pcap_parser::structure::{Field, Layout, Primitive};
//! use wifi_pcap_parser::Endianness;
//!
//! const FIELDS: &[Field] = &[
//!     Field::scalar("kind", Primitive::U8),
//!     Field::scalar("length", Primitive::U16),
//!     Field::array("address", Primitive::U8, 6),
//! ];
//! const LAYOUT: Layout = Layout::new(Endianness::Big, FIELDS);
//!
//! let data = [1, 0, 9, 1, 2, 3, 4, 5, 6, 0xff];
//! let (rem, record) = LAYOUT.decode(&data).expect("decode");
//! assert_eq!(rem, &[0xff]);
//! assert_eq!(record.get_u16("length"), Ok(9));
//! assert_eq!(record.get_bytes::<6>("address"), Ok([1, 2, 3, 4, 5, 6]));
//! assert_eq!(LAYOUT.encode(&record).expect("encode"), &data[..9]);
//! ```

use nom::multi::count;
use nom::IResult;
use std::convert::TryFrom;

pub use crate::endianness::Endianness;
use crate::error::DissectError;

/// Integer kinds a field can hold
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
}

impl Primitive {
    /// Width in bytes
    pub const fn width(self) -> usize {
        match self {
            Primitive::U8 | Primitive::I8 => 1,
            Primitive::U16 | Primitive::I16 => 2,
            Primitive::U32 | Primitive::I32 => 4,
            Primitive::U64 | Primitive::I64 => 8,
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Primitive::I8 | Primitive::I16 | Primitive::I32 | Primitive::I64
        )
    }
}

/// A single scalar, or a fixed number of scalars of the same kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(Primitive),
    Array(Primitive, usize),
}

impl FieldKind {
    pub const fn width(self) -> usize {
        match self {
            FieldKind::Scalar(p) => p.width(),
            FieldKind::Array(p, size) => p.width() * size,
        }
    }
}

/// A named field of a layout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn scalar(name: &'static str, kind: Primitive) -> Field {
        Field {
            name,
            kind: FieldKind::Scalar(kind),
        }
    }

    /// Array of `size` elements. `size` must be at least 1.
    pub const fn array(name: &'static str, kind: Primitive, size: usize) -> Field {
        assert!(size >= 1);
        Field {
            name,
            kind: FieldKind::Array(kind, size),
        }
    }
}

/// Fixed-width description of a binary record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub endianness: Endianness,
    pub fields: &'static [Field],
}

impl Layout {
    pub const fn new(endianness: Endianness, fields: &'static [Field]) -> Layout {
        Layout { endianness, fields }
    }

    /// Number of bytes consumed by this layout (sum of the field widths)
    pub const fn byte_width(&self) -> usize {
        let mut width = 0;
        let mut idx = 0;
        while idx < self.fields.len() {
            width += self.fields[idx].kind.width();
            idx += 1;
        }
        width
    }

    /// Decode the start of `i`, returning the remaining bytes and the raw record
    ///
    /// Fails with `BufferTooShort` (offset 0) if `i` is shorter than the layout.
    pub fn decode<'a>(&self, i: &'a [u8]) -> IResult<&'a [u8], Record, DissectError> {
        let width = self.byte_width();
        if i.len() < width {
            return Err(nom::Err::Error(DissectError::BufferTooShort {
                offset: 0,
                needed: width,
                available: i.len(),
            }));
        }
        let endianness = self.endianness;
        let mut record = Record::with_capacity(self.fields.len());
        let mut rem = i;
        for field in self.fields {
            let (i, value) = match field.kind {
                FieldKind::Scalar(kind) => {
                    let (i, s) = endianness.parse_scalar(kind, rem)?;
                    (i, Value::Scalar(s))
                }
                FieldKind::Array(kind, size) => {
                    let parse = |i: &'a [u8]| endianness.parse_scalar(kind, i);
                    let (i, v) = count(parse, size)(rem)?;
                    (i, Value::Array(v))
                }
            };
            record.insert(field.name, value);
            rem = i;
        }
        Ok((rem, record))
    }

    /// Encode a record, producing exactly `byte_width()` bytes
    pub fn encode(&self, record: &Record) -> Result<Vec<u8>, DissectError> {
        let endianness = self.endianness;
        let mut out = Vec::with_capacity(self.byte_width());
        for field in self.fields {
            let value = record
                .get(field.name)
                .ok_or(DissectError::MissingField(field.name))?;
            match (field.kind, value) {
                (FieldKind::Scalar(kind), Value::Scalar(s)) => {
                    out = endianness.gen_scalar(kind, *s, field.name, out)?;
                }
                (FieldKind::Array(kind, size), Value::Array(v)) if v.len() == size => {
                    for s in v {
                        out = endianness.gen_scalar(kind, *s, field.name, out)?;
                    }
                }
                _ => return Err(DissectError::FieldKindMismatch(field.name)),
            }
        }
        Ok(out)
    }
}

/// A decoded integer, widened to 64 bits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scalar {
    Unsigned(u64),
    Signed(i64),
}

/// Value of a field in a [`Record`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Scalar(Scalar),
    Array(Vec<Scalar>),
}

macro_rules! impl_value_from {
    ($variant:ident, $wide:ty, $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Value {
                    Value::Scalar(Scalar::$variant(<$wide>::from(v)))
                }
            }
        )*
    };
}

impl_value_from!(Unsigned, u64, u8, u16, u32, u64);
impl_value_from!(Signed, i64, i8, i16, i32, i64);

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Scalar(Scalar::Unsigned(u64::from(v)))
    }
}

impl<const N: usize> From<[u8; N]> for Value {
    fn from(v: [u8; N]) -> Value {
        Value::Array(v.iter().map(|b| Scalar::Unsigned(u64::from(*b))).collect())
    }
}

/// Mapping from field name to value, in layout order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    values: Vec<(&'static str, Value)>,
}

impl Record {
    pub fn new() -> Record {
        Record::default()
    }

    pub fn with_capacity(capacity: usize) -> Record {
        Record {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Set the value of a field, replacing any previous value
    pub fn insert<V: Into<Value>>(&mut self, name: &'static str, value: V) {
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.values.push((name, value)),
        }
    }

    /// Builder-style variant of [`insert`](Self::insert)
    pub fn with<V: Into<Value>>(mut self, name: &'static str, value: V) -> Record {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.values.iter().map(|(n, v)| (*n, v))
    }

    fn scalar(&self, name: &'static str) -> Result<Scalar, DissectError> {
        match self.get(name) {
            Some(Value::Scalar(s)) => Ok(*s),
            Some(Value::Array(_)) => Err(DissectError::FieldKindMismatch(name)),
            None => Err(DissectError::MissingField(name)),
        }
    }

    /// Get a scalar field as an unsigned integer of type `T`
    pub fn get_unsigned<T: TryFrom<u64>>(&self, name: &'static str) -> Result<T, DissectError> {
        let v = match self.scalar(name)? {
            Scalar::Unsigned(v) => v,
            Scalar::Signed(v) => u64::try_from(v).or(Err(DissectError::ValueOutOfRange(name)))?,
        };
        T::try_from(v).or(Err(DissectError::ValueOutOfRange(name)))
    }

    /// Get a scalar field as a signed integer of type `T`
    pub fn get_signed<T: TryFrom<i64>>(&self, name: &'static str) -> Result<T, DissectError> {
        let v = match self.scalar(name)? {
            Scalar::Signed(v) => v,
            Scalar::Unsigned(v) => i64::try_from(v).or(Err(DissectError::ValueOutOfRange(name)))?,
        };
        T::try_from(v).or(Err(DissectError::ValueOutOfRange(name)))
    }

    #[inline]
    pub fn get_u8(&self, name: &'static str) -> Result<u8, DissectError> {
        self.get_unsigned(name)
    }

    #[inline]
    pub fn get_u16(&self, name: &'static str) -> Result<u16, DissectError> {
        self.get_unsigned(name)
    }

    #[inline]
    pub fn get_u32(&self, name: &'static str) -> Result<u32, DissectError> {
        self.get_unsigned(name)
    }

    #[inline]
    pub fn get_u64(&self, name: &'static str) -> Result<u64, DissectError> {
        self.get_unsigned(name)
    }

    #[inline]
    pub fn get_i8(&self, name: &'static str) -> Result<i8, DissectError> {
        self.get_signed(name)
    }

    #[inline]
    pub fn get_i32(&self, name: &'static str) -> Result<i32, DissectError> {
        self.get_signed(name)
    }

    /// Get an array field
    pub fn get_array(&self, name: &'static str) -> Result<&[Scalar], DissectError> {
        match self.get(name) {
            Some(Value::Array(v)) => Ok(v),
            Some(Value::Scalar(_)) => Err(DissectError::FieldKindMismatch(name)),
            None => Err(DissectError::MissingField(name)),
        }
    }

    /// Get an array field of exactly `N` unsigned bytes
    pub fn get_bytes<const N: usize>(&self, name: &'static str) -> Result<[u8; N], DissectError> {
        let v = self.get_array(name)?;
        if v.len() != N {
            return Err(DissectError::FieldKindMismatch(name));
        }
        let mut out = [0u8; N];
        for (o, s) in out.iter_mut().zip(v) {
            *o = match *s {
                Scalar::Unsigned(b) => u8::try_from(b).ok(),
                Scalar::Signed(b) => u8::try_from(b).ok(),
            }
            .ok_or(DissectError::ValueOutOfRange(name))?;
        }
        Ok(out)
    }
}

/// A type backed by a constant layout, with semantic conversion hooks
pub trait Structure: Sized {
    const LAYOUT: Layout;

    /// Convert a raw record (as decoded by `LAYOUT`) to the semantic representation
    fn from_record(record: &Record) -> Result<Self, DissectError>;

    /// Convert back to a raw record suitable for `LAYOUT.encode`
    fn to_record(&self) -> Record;

    /// Size in bytes of the encoded structure
    #[inline]
    fn size() -> usize {
        Self::LAYOUT.byte_width()
    }

    /// Decode the structure from the start of `i`
    fn unpack(i: &[u8]) -> IResult<&[u8], Self, DissectError> {
        let (rem, record) = Self::LAYOUT.decode(i)?;
        let value = Self::from_record(&record).map_err(nom::Err::Error)?;
        Ok((rem, value))
    }

    /// Encode the structure
    fn pack(&self) -> Result<Vec<u8>, DissectError> {
        Self::LAYOUT.encode(&self.to_record())
    }
}
