//! Declaration macros for TL objects and polymorphic results.

/// Declares a TL constructor or function as a struct plus its field table.
///
/// Fields are listed in descriptor order, one per non-mask parameter, and
/// must carry the parameter's name.
///
/// ```rust
/// keyway_tl_types::tl_object! {
///     /// `pong#347773c5 msg_id:long ping_id:long = Pong`
///     pub struct Pong = "pong#347773c5 msg_id:long ping_id:long = Pong" {
///         pub msg_id: i64,
///         pub ping_id: i64,
///     }
/// }
/// ```
#[macro_export]
macro_rules! tl_object {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident = $descriptor:literal {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq)]
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field: $fty ),*
        }

        impl $crate::TlObject for $name {
            const DESCRIPTOR: &'static str = $descriptor;
            const FIELDS: &'static [$crate::codec::Field<Self>] = &[
                $(
                    $crate::codec::Field {
                        name: stringify!($field),
                        write: |obj, ty, buf| $crate::codec::FieldValue::write_value(&obj.$field, ty, buf),
                        read: |obj, ty, buf| {
                            obj.$field = $crate::codec::FieldValue::read_value(ty, buf)?;
                            Ok(())
                        },
                        size: |obj, ty| $crate::codec::FieldValue::value_size(&obj.$field, ty),
                        present: |obj, ty| $crate::codec::FieldValue::is_present(&obj.$field, ty),
                    }
                ),*
            ];
        }

        impl $crate::Serializable for $name {
            fn serialize(&self, buf: &mut Vec<u8>) -> $crate::Result<()> {
                $crate::codec::encode(self, buf)
            }

            fn serialized_len(&self) -> $crate::Result<usize> {
                $crate::codec::estimate_size(self)
            }
        }

        impl $crate::Deserializable for $name {
            fn deserialize(buf: $crate::deserialize::Buffer) -> $crate::Result<Self> {
                $crate::codec::decode(buf)
            }
        }

        impl $crate::codec::FieldValue for $name {
            fn write_value(&self, ty: &$crate::TypeExpr, buf: &mut Vec<u8>) -> $crate::Result<()> {
                $crate::codec::write_nested(self, ty, buf)
            }

            fn read_value(ty: &$crate::TypeExpr, buf: &mut $crate::Cursor<'_>) -> $crate::Result<Self> {
                $crate::codec::read_nested(ty, buf)
            }

            fn value_size(&self, ty: &$crate::TypeExpr) -> $crate::Result<usize> {
                $crate::codec::nested_size(self, ty)
            }
        }
    };
}

/// Declares a boxed TL type with several constructors as a closed enum.
///
/// Decoding peeks the leading constructor id and hands the bytes to the
/// variant whose descriptor carries that id.
#[macro_export]
macro_rules! tl_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident = $boxed:literal {
            $(#[$fmeta:meta])* $first:ident($first_inner:ty)
            $(, $(#[$vmeta:meta])* $variant:ident($inner:ty) )* $(,)?
        }
    ) => {
        $crate::tl_enum! {
            @impl $(#[$meta])* $vis $name = $boxed;
            $first($first_inner);
            $(#[$fmeta])* $first($first_inner) $(, $(#[$vmeta])* $variant($inner) )*
        }
    };
    (
        @impl $(#[$meta:meta])* $vis:vis $name:ident = $boxed:literal;
        $first:ident($first_inner:ty);
        $( $(#[$vmeta:meta])* $variant:ident($inner:ty) ),+
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant($inner) ),+
        }

        /// The first constructor with every field defaulted.
        impl Default for $name {
            fn default() -> Self {
                Self::$first(<$first_inner>::default())
            }
        }

        impl $name {
            /// Boxed TL type name shared by every variant.
            pub const TYPE_NAME: &'static str = $boxed;

            /// Constructor id of the held variant.
            pub fn constructor_id(&self) -> $crate::Result<u32> {
                match self {
                    $( Self::$variant(_) => Ok(<$inner as $crate::TlObject>::schema()?.id) ),+
                }
            }
        }

        impl $crate::Serializable for $name {
            fn serialize(&self, buf: &mut Vec<u8>) -> $crate::Result<()> {
                match self {
                    $( Self::$variant(v) => $crate::codec::encode(v, buf) ),+
                }
            }

            fn serialized_len(&self) -> $crate::Result<usize> {
                match self {
                    $( Self::$variant(v) => $crate::codec::estimate_size(v) ),+
                }
            }
        }

        impl $crate::Deserializable for $name {
            fn deserialize(buf: $crate::deserialize::Buffer) -> $crate::Result<Self> {
                let id = buf.peek_u32()?;
                $(
                    if id == <$inner as $crate::TlObject>::schema()?.id {
                        return $crate::codec::decode::<$inner>(buf).map(Self::$variant);
                    }
                )+
                Err($crate::Error::UnexpectedConstructor { id })
            }
        }

        impl $crate::codec::FieldValue for $name {
            fn write_value(&self, ty: &$crate::TypeExpr, buf: &mut Vec<u8>) -> $crate::Result<()> {
                match ty {
                    $crate::TypeExpr::Named { name, bare: false } if name == $boxed => {
                        $crate::Serializable::serialize(self, buf)
                    }
                    _ => Err($crate::Error::TypeMismatch {
                        expected: ty.clone(),
                        rust: stringify!($name),
                    }),
                }
            }

            fn read_value(ty: &$crate::TypeExpr, buf: &mut $crate::Cursor<'_>) -> $crate::Result<Self> {
                match ty {
                    $crate::TypeExpr::Named { name, bare: false } if name == $boxed => {
                        <Self as $crate::Deserializable>::deserialize(buf)
                    }
                    _ => Err($crate::Error::TypeMismatch {
                        expected: ty.clone(),
                        rust: stringify!($name),
                    }),
                }
            }

            fn value_size(&self, _ty: &$crate::TypeExpr) -> $crate::Result<usize> {
                $crate::Serializable::serialized_len(self)
            }
        }

        $(
            impl From<$inner> for $name {
                fn from(v: $inner) -> Self {
                    Self::$variant(v)
                }
            }
        )+
    };
}
