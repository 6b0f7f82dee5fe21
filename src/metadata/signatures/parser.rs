//! Parser for the type signatures stored in `TypeSpec` rows.

use crate::{
    file::parser::Parser,
    metadata::signatures::{ArrayShape, TypeSig, ELEMENT_TYPE},
    Error::RecursionLimit,
    Result,
};

const MAX_RECURSION_DEPTH: usize = 50;

/// Parse the blob of a `TypeSpec` row
///
/// # Errors
/// Returns an error if the blob is not a valid type signature
pub fn parse_type_spec_signature(data: &[u8]) -> Result<TypeSig> {
    SignatureParser::new(data).parse_type()
}

/// A recursive descent parser over a signature blob
pub struct SignatureParser<'a> {
    parser: Parser<'a>,
    depth: usize,
}

impl<'a> SignatureParser<'a> {
    /// Create a parser over `data`
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        SignatureParser {
            parser: Parser::new(data),
            depth: 0,
        }
    }

    /// Parse one `Type` production
    ///
    /// # Errors
    /// Returns an error if the data is truncated, an element type is unknown or the nesting is
    /// too deep
    pub fn parse_type(&mut self) -> Result<TypeSig> {
        self.depth += 1;
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(RecursionLimit(MAX_RECURSION_DEPTH));
        }

        let element_type = self.parser.read_le::<u8>()?;
        let signature = match element_type {
            ELEMENT_TYPE::VOID => TypeSig::Void,
            ELEMENT_TYPE::BOOLEAN => TypeSig::Boolean,
            ELEMENT_TYPE::CHAR => TypeSig::Char,
            ELEMENT_TYPE::I1 => TypeSig::I1,
            ELEMENT_TYPE::U1 => TypeSig::U1,
            ELEMENT_TYPE::I2 => TypeSig::I2,
            ELEMENT_TYPE::U2 => TypeSig::U2,
            ELEMENT_TYPE::I4 => TypeSig::I4,
            ELEMENT_TYPE::U4 => TypeSig::U4,
            ELEMENT_TYPE::I8 => TypeSig::I8,
            ELEMENT_TYPE::U8 => TypeSig::U8,
            ELEMENT_TYPE::R4 => TypeSig::R4,
            ELEMENT_TYPE::R8 => TypeSig::R8,
            ELEMENT_TYPE::STRING => TypeSig::String,
            ELEMENT_TYPE::OBJECT => TypeSig::Object,
            ELEMENT_TYPE::I => TypeSig::I,
            ELEMENT_TYPE::U => TypeSig::U,
            ELEMENT_TYPE::TYPEDBYREF => TypeSig::TypedByRef,
            ELEMENT_TYPE::CLASS => TypeSig::Class(self.parser.read_compressed_token()?),
            ELEMENT_TYPE::VALUETYPE => TypeSig::ValueType(self.parser.read_compressed_token()?),
            ELEMENT_TYPE::VAR => TypeSig::Var(self.parser.read_compressed_uint()?),
            ELEMENT_TYPE::MVAR => TypeSig::MVar(self.parser.read_compressed_uint()?),
            ELEMENT_TYPE::PTR => TypeSig::Ptr(Box::new(self.parse_type()?)),
            ELEMENT_TYPE::BYREF => TypeSig::ByRef(Box::new(self.parse_type()?)),
            ELEMENT_TYPE::PINNED => TypeSig::Pinned(Box::new(self.parse_type()?)),
            ELEMENT_TYPE::SZARRAY => TypeSig::SzArray(Box::new(self.parse_type()?)),
            ELEMENT_TYPE::CMOD_REQD => {
                let modifier = self.parser.read_compressed_token()?;
                TypeSig::CModReqd(modifier, Box::new(self.parse_type()?))
            }
            ELEMENT_TYPE::CMOD_OPT => {
                let modifier = self.parser.read_compressed_token()?;
                TypeSig::CModOpt(modifier, Box::new(self.parse_type()?))
            }
            ELEMENT_TYPE::ARRAY => {
                let element = self.parse_type()?;
                let rank = self.parser.read_compressed_uint()?;

                let num_sizes = self.parser.read_compressed_uint()?;
                let sizes = (0..num_sizes)
                    .map(|_| self.parser.read_compressed_uint())
                    .collect::<Result<Vec<_>>>()?;

                let num_lo_bounds = self.parser.read_compressed_uint()?;
                let lower_bounds = (0..num_lo_bounds)
                    .map(|_| self.parser.read_compressed_uint())
                    .collect::<Result<Vec<_>>>()?;

                TypeSig::Array(
                    Box::new(element),
                    ArrayShape {
                        rank,
                        sizes,
                        lower_bounds,
                    },
                )
            }
            ELEMENT_TYPE::GENERICINST => {
                let next = self.parser.peek_byte()?;
                if next != ELEMENT_TYPE::CLASS && next != ELEMENT_TYPE::VALUETYPE {
                    return Err(malformed_error!(
                        "GENERICINST - Next byte is not TYPE_CLASS or TYPE_VALUE - {}",
                        next
                    ));
                }

                let generic = self.parse_type()?;
                let arg_count = self.parser.read_compressed_uint()?;
                let mut args = Vec::with_capacity(arg_count.min(64) as usize);
                for _ in 0..arg_count {
                    args.push(self.parse_type()?);
                }

                TypeSig::GenericInst {
                    generic: Box::new(generic),
                    args,
                }
            }
            ELEMENT_TYPE::FNPTR => {
                let remaining = self.parser.remaining();
                TypeSig::FnPtr(self.parser.read_bytes(remaining)?.to_vec())
            }
            _ => {
                return Err(malformed_error!(
                    "Unsupported ELEMENT_TYPE - {}",
                    element_type
                ))
            }
        };

        self.depth -= 1;
        Ok(signature)
    }
}
