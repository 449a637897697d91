use cookie_factory::bytes::{
    be_i16, be_i32, be_i64, be_u16, be_u32, be_u64, le_i16, le_i32, le_i64, le_i8, le_u16,
    le_u32, le_u64, le_u8,
};
use cookie_factory::gen_simple;
use nom::number::complete as number;
use nom::IResult;
use std::convert::TryFrom;

use crate::error::DissectError;
use crate::structure::{Primitive, Scalar};

/// Byte order of multi-byte scalars in a layout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    #[inline]
    fn to_nom(self) -> nom::number::Endianness {
        match self {
            Endianness::Little => nom::number::Endianness::Little,
            Endianness::Big => nom::number::Endianness::Big,
        }
    }

    #[inline]
    pub fn u32_from_bytes(self, i: [u8; 4]) -> u32 {
        match self {
            Endianness::Little => u32::from_le_bytes(i),
            Endianness::Big => u32::from_be_bytes(i),
        }
    }

    /// Read one scalar of the given kind
    pub(crate) fn parse_scalar(
        self,
        kind: Primitive,
        i: &[u8],
    ) -> IResult<&[u8], Scalar, DissectError> {
        let e = self.to_nom();
        match kind {
            Primitive::U8 => {
                let (i, v) = number::u8::<_, DissectError>(i)?;
                Ok((i, Scalar::Unsigned(u64::from(v))))
            }
            Primitive::U16 => {
                let (i, v) = number::u16::<_, DissectError>(e)(i)?;
                Ok((i, Scalar::Unsigned(u64::from(v))))
            }
            Primitive::U32 => {
                let (i, v) = number::u32::<_, DissectError>(e)(i)?;
                Ok((i, Scalar::Unsigned(u64::from(v))))
            }
            Primitive::U64 => {
                let (i, v) = number::u64::<_, DissectError>(e)(i)?;
                Ok((i, Scalar::Unsigned(v)))
            }
            Primitive::I8 => {
                let (i, v) = number::i8::<_, DissectError>(i)?;
                Ok((i, Scalar::Signed(i64::from(v))))
            }
            Primitive::I16 => {
                let (i, v) = number::i16::<_, DissectError>(e)(i)?;
                Ok((i, Scalar::Signed(i64::from(v))))
            }
            Primitive::I32 => {
                let (i, v) = number::i32::<_, DissectError>(e)(i)?;
                Ok((i, Scalar::Signed(i64::from(v))))
            }
            Primitive::I64 => {
                let (i, v) = number::i64::<_, DissectError>(e)(i)?;
                Ok((i, Scalar::Signed(v)))
            }
        }
    }

    /// Append one scalar of the given kind to `out`
    ///
    /// `name` is only used to report out-of-range values.
    pub(crate) fn gen_scalar(
        self,
        kind: Primitive,
        value: Scalar,
        name: &'static str,
        out: Vec<u8>,
    ) -> Result<Vec<u8>, DissectError> {
        let res = match (kind, self) {
            (Primitive::U8, _) => gen_simple(le_u8(narrow(value, name)?), out),
            (Primitive::I8, _) => gen_simple(le_i8(narrow(value, name)?), out),
            (Primitive::U16, Endianness::Little) => gen_simple(le_u16(narrow(value, name)?), out),
            (Primitive::U16, Endianness::Big) => gen_simple(be_u16(narrow(value, name)?), out),
            (Primitive::U32, Endianness::Little) => gen_simple(le_u32(narrow(value, name)?), out),
            (Primitive::U32, Endianness::Big) => gen_simple(be_u32(narrow(value, name)?), out),
            (Primitive::U64, Endianness::Little) => gen_simple(le_u64(narrow(value, name)?), out),
            (Primitive::U64, Endianness::Big) => gen_simple(be_u64(narrow(value, name)?), out),
            (Primitive::I16, Endianness::Little) => gen_simple(le_i16(narrow(value, name)?), out),
            (Primitive::I16, Endianness::Big) => gen_simple(be_i16(narrow(value, name)?), out),
            (Primitive::I32, Endianness::Little) => gen_simple(le_i32(narrow(value, name)?), out),
            (Primitive::I32, Endianness::Big) => gen_simple(be_i32(narrow(value, name)?), out),
            (Primitive::I64, Endianness::Little) => gen_simple(le_i64(narrow(value, name)?), out),
            (Primitive::I64, Endianness::Big) => gen_simple(be_i64(narrow(value, name)?), out),
        };
        res.or(Err(DissectError::SerializeError))
    }
}

/// Convert a scalar to the concrete integer type of a field, checking its range
fn narrow<T>(value: Scalar, name: &'static str) -> Result<T, DissectError>
where
    T: TryFrom<u64> + TryFrom<i64>,
{
    let res = match value {
        Scalar::Unsigned(v) => <T as TryFrom<u64>>::try_from(v).ok(),
        Scalar::Signed(v) => <T as TryFrom<i64>>::try_from(v).ok(),
    };
    res.ok_or(DissectError::ValueOutOfRange(name))
}

#[cfg(test)]
mod tests {
    use super::Endianness;
    use crate::structure::{Primitive, Scalar};

    #[test]
    fn test_u32_from_bytes() {
        assert_eq!(Endianness::Little.u32_from_bytes([1, 0, 0, 0]), 1);
        assert_eq!(Endianness::Big.u32_from_bytes([0, 0, 0, 1]), 1);
    }

    #[test]
    fn test_parse_signed() {
        let (rem, v) = Endianness::Big
            .parse_scalar(Primitive::I16, &[0xff, 0xfe, 0x42])
            .expect("parse i16");
        assert_eq!(rem, &[0x42]);
        assert_eq!(v, Scalar::Signed(-2));
    }

    #[test]
    fn test_gen_out_of_range() {
        let res =
            Endianness::Little.gen_scalar(Primitive::U8, Scalar::Unsigned(256), "x", Vec::new());
        assert!(res.is_err());
        let res =
            Endianness::Little.gen_scalar(Primitive::U16, Scalar::Signed(-1), "x", Vec::new());
        assert!(res.is_err());
        let v = Endianness::Little
            .gen_scalar(Primitive::I8, Scalar::Signed(-3), "x", Vec::new())
            .expect("gen i8");
        assert_eq!(v, vec![0xfd]);
    }
}
