//! Type signatures (ECMA-335 II.23.2).
//!
//! Only the `TypeSpec` blob grammar is modeled, which is what the resolver needs to follow a
//! constructed type back to its definition or to a generic parameter.
//!
//! # Examples
//!
//! ```rust
//! use dotmodel::metadata::signatures::{parse_type_spec_signature, TypeSig};
//!
//! // !0[]
//! let signature = parse_type_spec_signature(&[0x1D, 0x13, 0x00])?;
//! assert_eq!(signature, TypeSig::SzArray(Box::new(TypeSig::Var(0))));
//! # Ok::<(), dotmodel::Error>(())
//! ```

mod parser;

pub use parser::{parse_type_spec_signature, SignatureParser};

use crate::metadata::token::Token;

/// Element type constants used in signature blobs
#[allow(non_snake_case, missing_docs)]
pub mod ELEMENT_TYPE {
    pub const END: u8 = 0x00;
    pub const VOID: u8 = 0x01;
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0A;
    pub const U8: u8 = 0x0B;
    pub const R4: u8 = 0x0C;
    pub const R8: u8 = 0x0D;
    pub const STRING: u8 = 0x0E;
    pub const PTR: u8 = 0x0F;
    pub const BYREF: u8 = 0x10;
    pub const VALUETYPE: u8 = 0x11;
    pub const CLASS: u8 = 0x12;
    pub const VAR: u8 = 0x13;
    pub const ARRAY: u8 = 0x14;
    pub const GENERICINST: u8 = 0x15;
    pub const TYPEDBYREF: u8 = 0x16;
    pub const I: u8 = 0x18;
    pub const U: u8 = 0x19;
    pub const FNPTR: u8 = 0x1B;
    pub const OBJECT: u8 = 0x1C;
    pub const SZARRAY: u8 = 0x1D;
    pub const MVAR: u8 = 0x1E;
    pub const CMOD_REQD: u8 = 0x1F;
    pub const CMOD_OPT: u8 = 0x20;
    pub const PINNED: u8 = 0x45;
}

/// One dimension of a general array
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArrayShape {
    /// Number of dimensions
    pub rank: u32,
    /// Sizes of the leading dimensions
    pub sizes: Vec<u32>,
    /// Lower bounds of the leading dimensions
    pub lower_bounds: Vec<u32>,
}

/// A parsed type signature
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum TypeSig {
    Void,
    Boolean,
    Char,
    I1,
    U1,
    I2,
    U2,
    I4,
    U4,
    I8,
    U8,
    R4,
    R8,
    String,
    Object,
    I,
    U,
    TypedByRef,
    /// A reference type, by `TypeDefOrRef` token
    Class(Token),
    /// A value type, by `TypeDefOrRef` token
    ValueType(Token),
    /// Instantiation of a generic type
    GenericInst {
        /// The generic type, a `Class` or `ValueType`
        generic: Box<TypeSig>,
        /// The type arguments
        args: Vec<TypeSig>,
    },
    /// Generic parameter of the enclosing type
    Var(u32),
    /// Generic parameter of the enclosing method
    MVar(u32),
    /// Single dimensional, zero based array
    SzArray(Box<TypeSig>),
    /// General array
    Array(Box<TypeSig>, ArrayShape),
    /// Unmanaged pointer
    Ptr(Box<TypeSig>),
    /// Managed pointer
    ByRef(Box<TypeSig>),
    /// Pinned local
    Pinned(Box<TypeSig>),
    /// Function pointer, its method signature is kept undecoded
    FnPtr(Vec<u8>),
    /// Required custom modifier
    CModReqd(Token, Box<TypeSig>),
    /// Optional custom modifier
    CModOpt(Token, Box<TypeSig>),
}

impl TypeSig {
    /// The `TypeDefOrRef` token naming this type, looking through generic instantiations and
    /// custom modifiers
    #[must_use]
    pub fn type_token(&self) -> Option<Token> {
        match self {
            TypeSig::Class(token) | TypeSig::ValueType(token) => Some(*token),
            TypeSig::GenericInst { generic, .. } => generic.type_token(),
            TypeSig::CModReqd(_, inner) | TypeSig::CModOpt(_, inner) => inner.type_token(),
            _ => None,
        }
    }
}
