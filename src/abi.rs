// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Minimal Solidity ABI codec for the two string-store contracts.
//!
//! Both contracts only ever take or return a single dynamic `string`, so the
//! codec covers exactly that: head/tail encoding of string arguments, decoding
//! of one returned string, selectors and event topics.

use crate::error::{CoreError, CoreResult};
use crate::types::{keccak, Address, Log, B256, U256};

pub const GET_STRING: &str = "getString()";
pub const SET_STRING: &str = "setString(string)";
pub const NESTED_DEPLOY: &str = "deploy(string)";
pub const NEW_STRING_EVENT: &str = "NewString(address)";

const WORD: usize = 32;

/// First four bytes of the keccak-256 of a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash.as_slice()[..4]);
    out
}

/// Topic zero of an event with the given canonical signature.
pub fn event_topic(signature: &str) -> B256 {
    keccak(signature.as_bytes())
}

/// ABI-encode a tuple of `string` values (no selector).
pub fn encode_strings(args: &[&str]) -> Vec<u8> {
    let head_len = WORD * args.len();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for arg in args {
        head.extend_from_slice(&U256::from(head_len + tail.len()).to_be_bytes::<32>());
        tail.extend_from_slice(&U256::from(arg.len()).to_be_bytes::<32>());
        tail.extend_from_slice(arg.as_bytes());
        let pad = (WORD - arg.len() % WORD) % WORD;
        tail.resize(tail.len() + pad, 0);
    }

    head.extend_from_slice(&tail);
    head
}

/// Calldata for `signature` invoked with string arguments.
pub fn encode_call(signature: &str, args: &[&str]) -> Vec<u8> {
    let mut data = selector(signature).to_vec();
    data.extend_from_slice(&encode_strings(args));
    data
}

/// Decode return data holding exactly one `string`.
pub fn decode_string(data: &[u8]) -> CoreResult<String> {
    let offset = read_len(data, 0)?;
    let len = read_len(data, offset)?;
    let start = offset
        .checked_add(WORD)
        .ok_or_else(|| CoreError::Abi("string offset overflows".into()))?;
    let end = start
        .checked_add(len)
        .ok_or_else(|| CoreError::Abi("string length overflows".into()))?;
    if end > data.len() {
        return Err(CoreError::Abi(format!(
            "string of {} bytes at offset {} exceeds {} bytes of return data",
            len,
            offset,
            data.len()
        )));
    }
    String::from_utf8(data[start..end].to_vec())
        .map_err(|e| CoreError::Abi(format!("string is not utf-8: {}", e)))
}

/// Address of the contract announced by a `NewString(address)` event in `logs`.
///
/// Accepts the address either indexed (topic one) or in the data section.
pub fn nested_contract_address(logs: &[Log]) -> CoreResult<Address> {
    let topic = event_topic(NEW_STRING_EVENT);
    let log = logs
        .iter()
        .find(|log| log.topic0() == Some(&topic))
        .ok_or_else(|| CoreError::Abi(format!("no {} event in receipt", NEW_STRING_EVENT)))?;

    if let Some(indexed) = log.topics().get(1) {
        return Ok(Address::from_word(*indexed));
    }
    let data = &log.data().data;
    if data.len() < WORD {
        return Err(CoreError::Abi(format!(
            "{} event carries {} data bytes",
            NEW_STRING_EVENT,
            data.len()
        )));
    }
    Ok(Address::from_slice(&data[12..WORD]))
}

/// Read a 32-byte big-endian word at `at` as a `usize`.
fn read_len(data: &[u8], at: usize) -> CoreResult<usize> {
    let end = at
        .checked_add(WORD)
        .ok_or_else(|| CoreError::Abi("word offset overflows".into()))?;
    let word = data.get(at..end).ok_or_else(|| {
        CoreError::Abi(format!("truncated return data: {} bytes, need {}", data.len(), end))
    })?;
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(CoreError::Abi(format!("word at {} does not fit a length", at)));
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(low))
        .map_err(|_| CoreError::Abi(format!("word at {} does not fit a length", at)))
}
