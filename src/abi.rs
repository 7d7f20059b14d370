//! Ethereum Contract ABI encoding for the small type vocabulary a
//! UserOperation needs: `address`, `uint256`, `bytes32`, `bytes`, tuples and
//! dynamic arrays of tuples.
//!
//! Every encoded value is a sequence of 32-byte words. Static values sit
//! inline in the "head" of their enclosing tuple; dynamic values leave an
//! offset word in the head and append their payload to the "tail".

use std::fmt;
use std::str::FromStr;

use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;

use crate::error::EncodingError;

pub const WORD: usize = 32;

pub type Word = [u8; WORD];

/// The supported ABI types. Anything else is unrepresentable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AbiType {
    Address,
    Uint256,
    Bytes32,
    Bytes,
    Tuple(Vec<AbiType>),
    /// `(..)[]`: a dynamic array whose elements are tuples of these fields.
    TupleArray(Vec<AbiType>),
}

impl AbiType {
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Address | AbiType::Uint256 | AbiType::Bytes32 => false,
            AbiType::Bytes | AbiType::TupleArray(_) => true,
            AbiType::Tuple(fields) => fields.iter().any(AbiType::is_dynamic),
        }
    }

    /// Number of bytes this type takes up in the head of its parent.
    pub fn head_size(&self) -> usize {
        match self {
            AbiType::Tuple(fields) if !self.is_dynamic() => {
                fields.iter().map(AbiType::head_size).sum()
            }
            _ => WORD,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AbiType::Address => "address",
            AbiType::Uint256 => "uint256",
            AbiType::Bytes32 => "bytes32",
            AbiType::Bytes => "bytes",
            AbiType::Tuple(_) => "tuple",
            AbiType::TupleArray(_) => "tuple[]",
        }
    }
}

impl fmt::Display for AbiType {
    /// Canonical form, as used inside function signatures.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiType::Tuple(fields) => write_tuple(f, fields),
            AbiType::TupleArray(fields) => {
                write_tuple(f, fields)?;
                f.write_str("[]")
            }
            scalar => f.write_str(scalar.name()),
        }
    }
}

fn write_tuple(f: &mut fmt::Formatter<'_>, fields: &[AbiType]) -> fmt::Result {
    f.write_str("(")?;
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{field}")?;
    }
    f.write_str(")")
}

impl FromStr for AbiType {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(inner) = s.strip_suffix("[]") {
            return match inner.parse::<AbiType>()? {
                AbiType::Tuple(fields) => Ok(AbiType::TupleArray(fields)),
                _ => Err(EncodingError::UnsupportedType(s.to_string())),
            };
        }

        if let Some(body) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
            let fields = split_top_level(body)
                .ok_or_else(|| EncodingError::UnsupportedType(s.to_string()))?
                .into_iter()
                .map(str::parse::<AbiType>)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(AbiType::Tuple(fields));
        }

        match s {
            "address" => Ok(AbiType::Address),
            "uint256" => Ok(AbiType::Uint256),
            "bytes32" => Ok(AbiType::Bytes32),
            "bytes" => Ok(AbiType::Bytes),
            other => Err(EncodingError::UnsupportedType(other.to_string())),
        }
    }
}

/// Splits a tuple body on the commas that are not nested inside parentheses.
/// Returns `None` when the parentheses do not balance.
fn split_top_level(body: &str) -> Option<Vec<&str>> {
    if body.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    parts.push(&body[start..]);
    Some(parts)
}

/// A value tree to be encoded against an [`AbiType`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Uint(U256),
    FixedBytes(H256),
    Bytes(Bytes),
    Tuple(Vec<AbiValue>),
    /// Elements of a `tuple[]`; each one must be a [`AbiValue::Tuple`].
    Array(Vec<AbiValue>),
}

impl AbiValue {
    /// Accepts up to 20 bytes, left-padding shorter input.
    pub fn address_from_slice(raw: &[u8]) -> Result<Self, EncodingError> {
        if raw.len() > 20 {
            return Err(EncodingError::ValueOutOfRange {
                ty: "address",
                reason: format!("{} bytes wide, at most 20 allowed", raw.len()),
            });
        }
        let mut addr = [0u8; 20];
        addr[20 - raw.len()..].copy_from_slice(raw);
        Ok(AbiValue::Address(Address::from(addr)))
    }

    /// Big-endian integer; leading zero bytes beyond 32 are tolerated.
    pub fn uint_from_be_slice(raw: &[u8]) -> Result<Self, EncodingError> {
        let first = raw.iter().position(|b| *b != 0).unwrap_or(raw.len());
        let significant = &raw[first..];
        if significant.len() > WORD {
            return Err(EncodingError::ValueOutOfRange {
                ty: "uint256",
                reason: format!("{} significant bytes exceed 2^256-1", significant.len()),
            });
        }
        Ok(AbiValue::Uint(U256::from_big_endian(significant)))
    }

    pub fn uint_from_dec_str(s: &str) -> Result<Self, EncodingError> {
        U256::from_dec_str(s)
            .map(AbiValue::Uint)
            .map_err(|e| EncodingError::ValueOutOfRange {
                ty: "uint256",
                reason: format!("{s:?}: {e:?}"),
            })
    }

    pub fn fixed_bytes_from_slice(raw: &[u8]) -> Result<Self, EncodingError> {
        if raw.len() != WORD {
            return Err(EncodingError::ValueOutOfRange {
                ty: "bytes32",
                reason: format!("expected 32 bytes, got {}", raw.len()),
            });
        }
        Ok(AbiValue::FixedBytes(H256::from_slice(raw)))
    }

    fn kind(&self) -> &'static str {
        match self {
            AbiValue::Address(_) => "address",
            AbiValue::Uint(_) => "uint256",
            AbiValue::FixedBytes(_) => "bytes32",
            AbiValue::Bytes(_) => "bytes",
            AbiValue::Tuple(_) => "tuple",
            AbiValue::Array(_) => "array",
        }
    }
}

fn mismatch(ty: &AbiType, value: &AbiValue) -> EncodingError {
    EncodingError::LayoutMismatch(format!(
        "{} value supplied for `{ty}`",
        value.kind()
    ))
}

pub fn address_word(addr: Address) -> Word {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(addr.as_bytes());
    word
}

pub fn uint_word(value: U256) -> Word {
    let mut word = [0u8; WORD];
    value.to_big_endian(&mut word);
    word
}

fn usize_word(n: usize) -> Word {
    uint_word(U256::from(n as u64))
}

/// Encodes a scalar into its single 32-byte word.
pub fn encode_static(value: &AbiValue, ty: &AbiType) -> Result<Word, EncodingError> {
    match (ty, value) {
        (AbiType::Address, AbiValue::Address(addr)) => Ok(address_word(*addr)),
        (AbiType::Uint256, AbiValue::Uint(v)) => Ok(uint_word(*v)),
        (AbiType::Bytes32, AbiValue::FixedBytes(h)) => Ok(h.0),
        _ => Err(mismatch(ty, value)),
    }
}

/// Length word followed by `data` right-padded to a word boundary.
pub fn encode_dynamic_bytes(data: &[u8]) -> Vec<u8> {
    let padded = data.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(WORD + padded);
    out.extend_from_slice(&usize_word(data.len()));
    out.extend_from_slice(data);
    out.resize(WORD + padded, 0);
    out
}

/// Head/tail encoding of `fields` laid out as `layout`. Offsets are relative
/// to the first byte of the returned buffer.
pub fn encode_tuple(fields: &[AbiValue], layout: &[AbiType]) -> Result<Vec<u8>, EncodingError> {
    if fields.len() != layout.len() {
        return Err(EncodingError::LayoutMismatch(format!(
            "tuple declares {} fields but {} were supplied",
            layout.len(),
            fields.len()
        )));
    }
    let head_size = layout.iter().map(AbiType::head_size).sum();
    encode_head_tail(fields.iter().zip(layout), head_size)
}

/// Count word followed by the element region. Per-element offsets are
/// relative to the start of the element region.
pub fn encode_array_of_tuples(
    items: &[AbiValue],
    tuple_layout: &[AbiType],
) -> Result<Vec<u8>, EncodingError> {
    let element = AbiType::Tuple(tuple_layout.to_vec());
    let region = encode_head_tail(
        items.iter().map(|item| (item, &element)),
        items.len() * element.head_size(),
    )?;

    let mut out = Vec::with_capacity(WORD + region.len());
    out.extend_from_slice(&usize_word(items.len()));
    out.extend(region);
    Ok(out)
}

/// Selector followed by the arguments encoded as one implicit tuple.
pub fn encode_function_call(
    selector: [u8; 4],
    args: &[AbiValue],
    inputs: &[AbiType],
) -> Result<Bytes, EncodingError> {
    let body = encode_tuple(args, inputs)?;
    let mut out = Vec::with_capacity(4 + body.len());
    out.extend_from_slice(&selector);
    out.extend(body);
    Ok(Bytes::from(out))
}

/// First four bytes of the keccak256 of a canonical function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn encode_head_tail<'a, I>(pairs: I, head_size: usize) -> Result<Vec<u8>, EncodingError>
where
    I: IntoIterator<Item = (&'a AbiValue, &'a AbiType)>,
{
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for (value, ty) in pairs {
        if ty.is_dynamic() {
            head.extend_from_slice(&usize_word(head_size + tail.len()));
            tail.extend(encode_value(value, ty)?);
        } else {
            head.extend(encode_value(value, ty)?);
        }
    }

    if head.len() != head_size {
        return Err(EncodingError::LayoutMismatch(format!(
            "head region is {} bytes, expected {head_size}",
            head.len()
        )));
    }

    head.extend(tail);
    Ok(head)
}

fn encode_value(value: &AbiValue, ty: &AbiType) -> Result<Vec<u8>, EncodingError> {
    match (ty, value) {
        (AbiType::Address | AbiType::Uint256 | AbiType::Bytes32, _) => {
            Ok(encode_static(value, ty)?.to_vec())
        }
        (AbiType::Bytes, AbiValue::Bytes(data)) => Ok(encode_dynamic_bytes(data)),
        (AbiType::Tuple(layout), AbiValue::Tuple(fields)) => encode_tuple(fields, layout),
        (AbiType::TupleArray(layout), AbiValue::Array(items)) => {
            encode_array_of_tuples(items, layout)
        }
        _ => Err(mismatch(ty, value)),
    }
}

/// A contract function: name plus ordered input types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub name: &'static str,
    pub inputs: Vec<AbiType>,
}

impl Function {
    pub fn new(name: &'static str, inputs: Vec<AbiType>) -> Self {
        Self { name, inputs }
    }

    /// `name(type1,type2,...)`
    pub fn signature(&self) -> String {
        let inputs: Vec<String> = self.inputs.iter().map(ToString::to_string).collect();
        format!("{}({})", self.name, inputs.join(","))
    }

    pub fn selector(&self) -> [u8; 4] {
        selector(&self.signature())
    }

    pub fn encode_call(&self, args: &[AbiValue]) -> Result<Bytes, EncodingError> {
        tracing::debug!(function = %self.signature(), args = args.len(), "encoding call");
        encode_function_call(self.selector(), args, &self.inputs)
    }
}
