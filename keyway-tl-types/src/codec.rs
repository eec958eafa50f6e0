//! The schema-driven encoder/decoder.
//!
//! An object type implements [`TlObject`] by naming its descriptor and
//! listing one [`Field`] per value parameter, in schema order. Masks (`#`)
//! have no field: [`encode`] computes them from which flagged fields are
//! present, [`decode`] reads them and skips the parameters whose bit is
//! clear. Field types implement [`FieldValue`] and check that they can hold
//! the wire type the descriptor asks for.
//!
//! Types are declared with [`crate::tl_object!`] and [`crate::tl_enum!`],
//! which build the field table and the trait impls.

use std::sync::Arc;

use keyway_tl_parser::{schema_for, Param, ParamType, TypeExpr, TypeSchema};

use crate::deserialize::Cursor;
use crate::error::{Error, Result};
use crate::serialize::{tl_bytes_len, write_i32, write_i64, write_tl_bytes, write_u32};
use crate::{BOOL_FALSE_ID, BOOL_TRUE_ID, VECTOR_ID};

/// Accessors for one value parameter of `T`.
pub struct Field<T> {
    /// Must equal the parameter name in the descriptor.
    pub name: &'static str,
    pub write: fn(&T, &TypeExpr, &mut Vec<u8>) -> Result<()>,
    pub read: fn(&mut T, &TypeExpr, &mut Cursor<'_>) -> Result<()>,
    pub size: fn(&T, &TypeExpr) -> Result<usize>,
    /// Whether a flagged parameter goes on the wire (and sets its bit).
    pub present: fn(&T, &TypeExpr) -> bool,
}

/// A concrete TL constructor or function.
pub trait TlObject: Default + Sized + 'static {
    /// The TL line this type was declared from.
    const DESCRIPTOR: &'static str;
    /// One entry per non-mask parameter, in schema order.
    const FIELDS: &'static [Field<Self>];

    /// The parsed descriptor, shared through the process-wide cache.
    fn schema() -> Result<Arc<TypeSchema>> {
        Ok(schema_for(Self::DESCRIPTOR)?)
    }
}

/// A Rust type that can hold a parameter value.
pub trait FieldValue: Sized {
    fn write_value(&self, ty: &TypeExpr, buf: &mut Vec<u8>) -> Result<()>;
    fn read_value(ty: &TypeExpr, buf: &mut Cursor<'_>) -> Result<Self>;
    fn value_size(&self, ty: &TypeExpr) -> Result<usize>;

    /// Optional parameters report absence here; everything else is present.
    fn is_present(&self, _ty: &TypeExpr) -> bool {
        true
    }
}

pub(crate) fn mismatch<T>(ty: &TypeExpr) -> Error {
    Error::TypeMismatch { expected: ty.clone(), rust: std::any::type_name::<T>() }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Writes the constructor id followed by the body.
pub fn encode<T: TlObject>(obj: &T, buf: &mut Vec<u8>) -> Result<()> {
    let schema = T::schema()?;
    write_u32(buf, schema.id);
    encode_fields(obj, &schema, buf)
}

/// Writes the body only, for bare (lowercase) uses of a type.
pub fn encode_bare<T: TlObject>(obj: &T, buf: &mut Vec<u8>) -> Result<()> {
    encode_fields(obj, &*T::schema()?, buf)
}

/// Reads the constructor id, checks it, then reads the body.
pub fn decode<T: TlObject>(buf: &mut Cursor<'_>) -> Result<T> {
    let schema = T::schema()?;
    let got = buf.read_u32()?;
    if got != schema.id {
        return Err(Error::ConstructorMismatch { expected: schema.id, got });
    }
    decode_fields(&schema, buf)
}

pub fn decode_bare<T: TlObject>(buf: &mut Cursor<'_>) -> Result<T> {
    decode_fields(&*T::schema()?, buf)
}

/// Exact encoded length of `obj`, constructor id included.
pub fn estimate_size<T: TlObject>(obj: &T) -> Result<usize> {
    Ok(4 + fields_size(obj, &*T::schema()?)?)
}

fn bind<'f, T>(
    fields: &mut impl Iterator<Item = &'f Field<T>>,
    schema: &TypeSchema,
    param: &Param,
) -> Result<&'f Field<T>>
where
    T: 'f,
{
    fields.next().filter(|f| f.name == param.name).ok_or_else(|| Error::FieldMismatch {
        schema: schema.name.clone(),
        param: param.name.clone(),
    })
}

fn ensure_exhausted<'f, T: 'f>(
    mut fields: impl Iterator<Item = &'f Field<T>>,
    schema: &TypeSchema,
) -> Result<()> {
    match fields.next() {
        None => Ok(()),
        Some(extra) => Err(Error::FieldMismatch {
            schema: schema.name.clone(),
            param: extra.name.to_owned(),
        }),
    }
}

/// Bit masks for every `#` parameter, set from the present flagged fields.
fn compute_masks<'s, T: TlObject>(obj: &T, schema: &'s TypeSchema) -> Result<Vec<(&'s str, u32)>> {
    let mut masks: Vec<(&str, u32)> = schema
        .params
        .iter()
        .filter(|p| p.ty == ParamType::Mask)
        .map(|p| (p.name.as_str(), 0))
        .collect();

    let mut fields = T::FIELDS.iter();
    for param in schema.values() {
        let field = bind(&mut fields, schema, param)?;
        if let ParamType::Value { ty, flag: Some(flag) } = &param.ty {
            if (field.present)(obj, ty) {
                if let Some((_, mask)) = masks.iter_mut().find(|(name, _)| *name == flag.mask) {
                    *mask |= 1 << flag.bit;
                }
            }
        }
    }
    ensure_exhausted(fields, schema)?;
    Ok(masks)
}

fn mask_value(masks: &[(&str, u32)], name: &str) -> u32 {
    masks.iter().find(|(n, _)| *n == name).map_or(0, |(_, m)| *m)
}

fn encode_fields<T: TlObject>(obj: &T, schema: &TypeSchema, buf: &mut Vec<u8>) -> Result<()> {
    let masks = compute_masks(obj, schema)?;
    let mut fields = T::FIELDS.iter();
    for param in &schema.params {
        match &param.ty {
            ParamType::Mask => write_u32(buf, mask_value(&masks, &param.name)),
            ParamType::Value { ty, flag } => {
                let field = bind(&mut fields, schema, param)?;
                match (flag, (field.present)(obj, ty)) {
                    (Some(_), false) => continue,
                    (None, false) => return Err(Error::MissingValue { param: field.name }),
                    _ => (field.write)(obj, ty, buf)?,
                }
            }
        }
    }
    Ok(())
}

fn decode_fields<T: TlObject>(schema: &TypeSchema, buf: &mut Cursor<'_>) -> Result<T> {
    let mut obj = T::default();
    let mut masks: Vec<(&str, u32)> = Vec::new();
    let mut fields = T::FIELDS.iter();
    for param in &schema.params {
        match &param.ty {
            ParamType::Mask => masks.push((param.name.as_str(), buf.read_u32()?)),
            ParamType::Value { ty, flag } => {
                let field = bind(&mut fields, schema, param)?;
                if let Some(flag) = flag {
                    if mask_value(&masks, &flag.mask) & (1 << flag.bit) == 0 {
                        continue;
                    }
                }
                (field.read)(&mut obj, ty, buf)?;
            }
        }
    }
    ensure_exhausted(fields, schema)?;
    Ok(obj)
}

fn fields_size<T: TlObject>(obj: &T, schema: &TypeSchema) -> Result<usize> {
    let mut total = 0;
    let mut fields = T::FIELDS.iter();
    for param in &schema.params {
        match &param.ty {
            ParamType::Mask => total += 4,
            ParamType::Value { ty, flag } => {
                let field = bind(&mut fields, schema, param)?;
                if flag.is_none() || (field.present)(obj, ty) {
                    total += (field.size)(obj, ty)?;
                }
            }
        }
    }
    ensure_exhausted(fields, schema)?;
    Ok(total)
}

// ─── Nested objects ──────────────────────────────────────────────────────────

fn nested_kind<T: TlObject>(ty: &TypeExpr) -> Result<bool> {
    let schema = T::schema()?;
    match ty {
        TypeExpr::Named { name, bare: false } if *name == schema.result_type => Ok(false),
        TypeExpr::Named { name, bare: true } if *name == schema.name => Ok(true),
        _ => Err(mismatch::<T>(ty)),
    }
}

/// [`FieldValue::write_value`] for a field holding another object.
pub fn write_nested<T: TlObject>(obj: &T, ty: &TypeExpr, buf: &mut Vec<u8>) -> Result<()> {
    if nested_kind::<T>(ty)? { encode_bare(obj, buf) } else { encode(obj, buf) }
}

pub fn read_nested<T: TlObject>(ty: &TypeExpr, buf: &mut Cursor<'_>) -> Result<T> {
    if nested_kind::<T>(ty)? { decode_bare(buf) } else { decode(buf) }
}

pub fn nested_size<T: TlObject>(obj: &T, ty: &TypeExpr) -> Result<usize> {
    let bare = nested_kind::<T>(ty)?;
    Ok(fields_size(obj, &*T::schema()?)? + if bare { 0 } else { 4 })
}

// ─── Primitive field values ──────────────────────────────────────────────────

macro_rules! fixed_field {
    ($rust:ty, $size:literal, $($expr:pat_param)|+, $write:expr, $read:expr) => {
        impl FieldValue for $rust {
            fn write_value(&self, ty: &TypeExpr, buf: &mut Vec<u8>) -> Result<()> {
                match ty {
                    $($expr)|+ => {
                        $write(buf, *self);
                        Ok(())
                    }
                    _ => Err(mismatch::<Self>(ty)),
                }
            }

            fn read_value(ty: &TypeExpr, buf: &mut Cursor<'_>) -> Result<Self> {
                match ty {
                    $($expr)|+ => $read(buf),
                    _ => Err(mismatch::<Self>(ty)),
                }
            }

            fn value_size(&self, ty: &TypeExpr) -> Result<usize> {
                match ty {
                    $($expr)|+ => Ok($size),
                    _ => Err(mismatch::<Self>(ty)),
                }
            }
        }
    };
}

fixed_field!(i32, 4, TypeExpr::Int | TypeExpr::Date, write_i32, |b: &mut Cursor<'_>| b.read_i32());
fixed_field!(i64, 8, TypeExpr::Long, write_i64, |b: &mut Cursor<'_>| b.read_i64());
fixed_field!(
    f64, 8, TypeExpr::Double,
    |buf: &mut Vec<u8>, v: f64| buf.extend_from_slice(&v.to_le_bytes()),
    |b: &mut Cursor<'_>| b.read_f64()
);
fixed_field!(
    [u8; 16], 16, TypeExpr::Int128,
    |buf: &mut Vec<u8>, v: [u8; 16]| buf.extend_from_slice(&v),
    |b: &mut Cursor<'_>| b.read_array::<16>()
);
fixed_field!(
    [u8; 32], 32, TypeExpr::Int256,
    |buf: &mut Vec<u8>, v: [u8; 32]| buf.extend_from_slice(&v),
    |b: &mut Cursor<'_>| b.read_array::<32>()
);

/// `Bool` is a boxed sentinel; `true` is a bare flag with no bytes.
impl FieldValue for bool {
    fn write_value(&self, ty: &TypeExpr, buf: &mut Vec<u8>) -> Result<()> {
        match ty {
            TypeExpr::Bool => write_u32(buf, if *self { BOOL_TRUE_ID } else { BOOL_FALSE_ID }),
            TypeExpr::True => {}
            _ => return Err(mismatch::<Self>(ty)),
        }
        Ok(())
    }

    fn read_value(ty: &TypeExpr, buf: &mut Cursor<'_>) -> Result<Self> {
        match ty {
            TypeExpr::Bool => match buf.read_u32()? {
                BOOL_TRUE_ID => Ok(true),
                BOOL_FALSE_ID => Ok(false),
                id => Err(Error::InvalidBool { id }),
            },
            // Only reached when the flag bit was set
            TypeExpr::True => Ok(true),
            _ => Err(mismatch::<Self>(ty)),
        }
    }

    fn value_size(&self, ty: &TypeExpr) -> Result<usize> {
        match ty {
            TypeExpr::Bool => Ok(4),
            TypeExpr::True => Ok(0),
            _ => Err(mismatch::<Self>(ty)),
        }
    }

    fn is_present(&self, ty: &TypeExpr) -> bool {
        !matches!(ty, TypeExpr::True) || *self
    }
}

impl FieldValue for Vec<u8> {
    fn write_value(&self, ty: &TypeExpr, buf: &mut Vec<u8>) -> Result<()> {
        match ty {
            TypeExpr::Bytes => {
                write_tl_bytes(buf, self);
                Ok(())
            }
            _ => Err(mismatch::<Self>(ty)),
        }
    }

    fn read_value(ty: &TypeExpr, buf: &mut Cursor<'_>) -> Result<Self> {
        match ty {
            TypeExpr::Bytes => Ok(buf.read_tl_bytes()?.to_vec()),
            _ => Err(mismatch::<Self>(ty)),
        }
    }

    fn value_size(&self, ty: &TypeExpr) -> Result<usize> {
        match ty {
            TypeExpr::Bytes => Ok(tl_bytes_len(self.len())),
            _ => Err(mismatch::<Self>(ty)),
        }
    }
}

impl FieldValue for String {
    fn write_value(&self, ty: &TypeExpr, buf: &mut Vec<u8>) -> Result<()> {
        match ty {
            TypeExpr::String => {
                write_tl_bytes(buf, self.as_bytes());
                Ok(())
            }
            _ => Err(mismatch::<Self>(ty)),
        }
    }

    fn read_value(ty: &TypeExpr, buf: &mut Cursor<'_>) -> Result<Self> {
        match ty {
            TypeExpr::String => {
                let raw = buf.read_tl_bytes()?;
                String::from_utf8(raw.to_vec()).map_err(|_| Error::InvalidUtf8)
            }
            _ => Err(mismatch::<Self>(ty)),
        }
    }

    fn value_size(&self, ty: &TypeExpr) -> Result<usize> {
        match ty {
            TypeExpr::String => Ok(tl_bytes_len(self.len())),
            _ => Err(mismatch::<Self>(ty)),
        }
    }
}

/// `Vector<T>` and `vector<T>`; the descriptor decides whether the marker is written.
impl<T: FieldValue> FieldValue for Vec<T> {
    fn write_value(&self, ty: &TypeExpr, buf: &mut Vec<u8>) -> Result<()> {
        let TypeExpr::Vector { boxed, item } = ty else {
            return Err(mismatch::<Self>(ty));
        };
        if *boxed {
            write_u32(buf, VECTOR_ID);
        }
        write_i32(buf, self.len() as i32);
        self.iter().try_for_each(|v| v.write_value(item, buf))
    }

    fn read_value(ty: &TypeExpr, buf: &mut Cursor<'_>) -> Result<Self> {
        let TypeExpr::Vector { boxed, item } = ty else {
            return Err(mismatch::<Self>(ty));
        };
        if *boxed {
            let id = buf.read_u32()?;
            if id != VECTOR_ID {
                return Err(Error::BadVectorMarker { id });
            }
        }
        let count = buf.read_i32()?;
        let count = usize::try_from(count).map_err(|_| Error::InvalidLength(count))?;
        let mut out = Vec::with_capacity(count.min(buf.remaining()));
        for _ in 0..count {
            out.push(T::read_value(item, buf)?);
        }
        Ok(out)
    }

    fn value_size(&self, ty: &TypeExpr) -> Result<usize> {
        let TypeExpr::Vector { boxed, item } = ty else {
            return Err(mismatch::<Self>(ty));
        };
        let header = if *boxed { 8 } else { 4 };
        self.iter().try_fold(header, |acc, v| Ok(acc + v.value_size(item)?))
    }
}

/// Flagged parameters: `None` leaves the bit clear and writes nothing.
impl<T: FieldValue> FieldValue for Option<T> {
    fn write_value(&self, ty: &TypeExpr, buf: &mut Vec<u8>) -> Result<()> {
        self.as_ref().map_or(Ok(()), |v| v.write_value(ty, buf))
    }

    fn read_value(ty: &TypeExpr, buf: &mut Cursor<'_>) -> Result<Self> {
        T::read_value(ty, buf).map(Some)
    }

    fn value_size(&self, ty: &TypeExpr) -> Result<usize> {
        self.as_ref().map_or(Ok(0), |v| v.value_size(ty))
    }

    fn is_present(&self, _ty: &TypeExpr) -> bool {
        self.is_some()
    }
}
