//! Edge-set codec.
//!
//! An adjacency record is stored as the concatenation of its members, each one
//! terminated by [`DELIMITER`]. A literal delimiter or [`ESCAPE`] byte inside a
//! member is prefixed with [`ESCAPE`], so any byte string round-trips.
//! Members free of both bytes encode exactly as `member|`.
//!
//! Both functions are total: decoding never fails, malformed input is read
//! leniently (see [`decode`]).

use crate::graph::EdgeSet;
use log::trace;

/// Terminates every encoded member.
pub const DELIMITER: u8 = b'|';

/// Marks the following byte as literal member data.
pub const ESCAPE: u8 = b'\\';

/// Encode an edge set into its stored byte form.
///
/// The empty set encodes to an empty byte sequence.
pub fn encode(set: &EdgeSet) -> Vec<u8> {
    let capacity = set.iter().map(|m| m.len() + 1).sum();
    let mut out = Vec::with_capacity(capacity);

    for member in set {
        for &byte in member {
            if byte == DELIMITER || byte == ESCAPE {
                out.push(ESCAPE);
            }
            out.push(byte);
        }
        out.push(DELIMITER);
    }

    trace!("Encoded {} members into {} bytes", set.len(), out.len());
    out
}

/// Decode a stored byte sequence into an edge set.
///
/// Every delimiter-terminated segment becomes a member, including the empty
/// identifier. A trailing unterminated segment is kept if it is non-empty.
/// An escape byte takes the next byte literally; a dangling escape at the end
/// of input is kept as a literal [`ESCAPE`].
pub fn decode(bytes: &[u8]) -> EdgeSet {
    let mut set = EdgeSet::new();
    let mut current = Vec::new();
    let mut iter = bytes.iter().copied();

    while let Some(byte) = iter.next() {
        match byte {
            ESCAPE => current.push(iter.next().unwrap_or(ESCAPE)),
            DELIMITER => {
                set.insert(std::mem::take(&mut current));
            }
            _ => current.push(byte),
        }
    }

    if !current.is_empty() {
        set.insert(current);
    }

    set
}
