//! VAA's represent a collection of signatures combined with a message and its metadata. VAA's are
//! used as a form of proof; by submitting a VAA to a target contract, the receiving contract can
//! make assumptions about the validity of state on the source chain.
//!
//! The wire layout, all integers big-endian:
//!
//! ```markdown
//! header: version:u8 guardian_set_index:u32 signature_count:u8
//!         [index:u8 r:32 s:32 recovery_id:u8] * signature_count
//! body:   timestamp:u32 nonce:u32 emitter_chain:u16 emitter_address:32 sequence:u64
//!         consistency_level:u8 payload:*
//! ```
//!
//! The payload runs to the end of the buffer and is decoded by a [`VaaPayload`] implementation.

use std::io::{self, Write};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sha3::Digest as Sha3Digest;

use crate::{Chain, Error, UniversalAddress, WormholeMessageId, GOVERNANCE_EMITTER};

/// Signatures are typical ECDSA signatures prefixed with a Guardian position.
#[derive(
    Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Signature {
    pub index: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub recovery_id: u8,
}

/// A payload that occupies the remainder of a VAA body.
pub trait VaaPayload: Sized {
    fn to_payload_bytes(&self) -> Result<Vec<u8>, Error>;

    fn from_payload_bytes(buf: &[u8]) -> Result<Self, Error>;
}

/// Raw, undecoded payload bytes. Useful when parsing the payload needs to be delayed.
impl VaaPayload for Vec<u8> {
    fn to_payload_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(self.clone())
    }

    fn from_payload_bytes(buf: &[u8]) -> Result<Self, Error> {
        Ok(buf.to_vec())
    }
}

/// The core VAA itself. This structure is what is received by a contract on the receiving side of
/// a wormhole message passing flow. The generic parameter `P` represents the payload for the VAA.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Vaa<P = Vec<u8>> {
    pub version: u8,
    pub guardian_set_index: u32,
    pub signatures: Vec<Signature>,
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: Chain,
    pub emitter_address: UniversalAddress,
    pub sequence: u64,
    pub consistency_level: u8,
    pub payload: P,
}

/// The header for a VAA.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Header {
    pub version: u8,
    pub guardian_set_index: u32,
    pub signatures: Vec<Signature>,
}

/// The body for a VAA.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Body<P = Vec<u8>> {
    /// Seconds since UNIX epoch.
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: Chain,
    pub emitter_address: UniversalAddress,
    pub sequence: u64,
    pub consistency_level: u8,
    pub payload: P,
}

// The fixed width part of the body, everything before the payload.
#[derive(Serialize, Deserialize)]
struct Envelope {
    timestamp: u32,
    nonce: u32,
    emitter_chain: Chain,
    emitter_address: UniversalAddress,
    sequence: u64,
    consistency_level: u8,
}

/// Digest data for the Body.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest {
    /// Guardians don't hash the VAA body directly, instead they hash the VAA and sign the hash.
    /// This is the canonical identity of a VAA.
    pub hash: [u8; 32],

    /// The hash of the hash of the VAA. secp256k hashes its payload before signing, so this is
    /// what a guardian signature actually covers. The EVM token bridge also keys completed
    /// transfers by this value, so it is the argument to its `isTransferCompleted`.
    pub secp256k_hash: [u8; 32],
}

/// Calculates and returns the digest for `body` to be used in VAA operations.
///
/// A VAA is distinguished by the unique 256bit Keccak256 hash of its body. This hash is
/// utilised in all Wormhole components for identifying unique VAA's, including the bridge,
/// modules, and core guardian software. The `Digest` is documented with reasoning for
/// each field.
pub fn digest(body: &[u8]) -> io::Result<Digest> {
    let hash: [u8; 32] = {
        let mut h = sha3::Keccak256::default();
        h.write_all(body)?;
        h.finalize().into()
    };

    let secp256k_hash = double_hash(&hash)?;

    Ok(Digest {
        hash,
        secp256k_hash,
    })
}

/// Hash a VAA hash a second time. See [`Digest::secp256k_hash`].
pub fn double_hash(hash: &[u8; 32]) -> io::Result<[u8; 32]> {
    let mut h = sha3::Keccak256::default();
    h.write_all(hash)?;
    Ok(h.finalize().into())
}

impl<P> Vaa<P> {
    /// Check if the VAA is a Governance VAA.
    pub fn is_governance(&self) -> bool {
        self.emitter_address == GOVERNANCE_EMITTER && self.emitter_chain == Chain::Solana
    }

    pub fn message_id(&self) -> WormholeMessageId {
        WormholeMessageId {
            chain: self.emitter_chain,
            emitter: self.emitter_address,
            sequence: self.sequence,
        }
    }

    pub fn header(&self) -> Header {
        Header {
            version: self.version,
            guardian_set_index: self.guardian_set_index,
            signatures: self.signatures.clone(),
        }
    }
}

impl<P: VaaPayload> Vaa<P> {
    pub fn from_bytes(buf: &[u8]) -> Result<Self, Error> {
        let (header, body) = serde_wormhole::from_slice_with_payload::<Header>(buf)?;
        let body = Body::<P>::from_bytes(body)?;

        Ok((header, body).into())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut buf = serde_wormhole::to_vec(&self.header())?;
        buf.extend(self.body_bytes()?);
        Ok(buf)
    }

    /// The serialized body, the input to the digest.
    pub fn body_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut buf = serde_wormhole::to_vec(&Envelope {
            timestamp: self.timestamp,
            nonce: self.nonce,
            emitter_chain: self.emitter_chain,
            emitter_address: self.emitter_address,
            sequence: self.sequence,
            consistency_level: self.consistency_level,
        })?;
        buf.extend(self.payload.to_payload_bytes()?);
        Ok(buf)
    }

    pub fn digest(&self) -> anyhow::Result<Digest> {
        let body = self.body_bytes().context("failed to serialize body")?;
        digest(&body).context("failed to compute digest")
    }
}

impl Vaa<Vec<u8>> {
    /// Decode the raw payload of a VAA parsed earlier.
    pub fn parse_payload<P: VaaPayload>(self) -> Result<Vaa<P>, Error> {
        let (header, body): (Header, Body) = self.into();
        let payload = P::from_payload_bytes(&body.payload)?;

        Ok((header, body.with_payload(payload)).into())
    }
}

impl<P> From<Vaa<P>> for (Header, Body<P>) {
    fn from(v: Vaa<P>) -> Self {
        (
            Header {
                version: v.version,
                guardian_set_index: v.guardian_set_index,
                signatures: v.signatures,
            },
            Body {
                timestamp: v.timestamp,
                nonce: v.nonce,
                emitter_chain: v.emitter_chain,
                emitter_address: v.emitter_address,
                sequence: v.sequence,
                consistency_level: v.consistency_level,
                payload: v.payload,
            },
        )
    }
}

impl<P> From<(Header, Body<P>)> for Vaa<P> {
    fn from((hdr, body): (Header, Body<P>)) -> Self {
        Vaa {
            version: hdr.version,
            guardian_set_index: hdr.guardian_set_index,
            signatures: hdr.signatures,
            timestamp: body.timestamp,
            nonce: body.nonce,
            emitter_chain: body.emitter_chain,
            emitter_address: body.emitter_address,
            sequence: body.sequence,
            consistency_level: body.consistency_level,
            payload: body.payload,
        }
    }
}

impl<P> Body<P> {
    /// Replace the payload of the body.
    pub fn with_payload<U>(self, p: U) -> Body<U> {
        Body {
            timestamp: self.timestamp,
            nonce: self.nonce,
            emitter_chain: self.emitter_chain,
            emitter_address: self.emitter_address,
            sequence: self.sequence,
            consistency_level: self.consistency_level,
            payload: p,
        }
    }
}

impl<P: VaaPayload> Body<P> {
    pub fn from_bytes(buf: &[u8]) -> Result<Self, Error> {
        let (env, payload) = serde_wormhole::from_slice_with_payload::<Envelope>(buf)?;

        Ok(Body {
            timestamp: env.timestamp,
            nonce: env.nonce,
            emitter_chain: env.emitter_chain,
            emitter_address: env.emitter_address,
            sequence: env.sequence,
            consistency_level: env.consistency_level,
            payload: P::from_payload_bytes(payload)?,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut buf = serde_wormhole::to_vec(&Envelope {
            timestamp: self.timestamp,
            nonce: self.nonce,
            emitter_chain: self.emitter_chain,
            emitter_address: self.emitter_address,
            sequence: self.sequence,
            consistency_level: self.consistency_level,
        })?;
        buf.extend(self.payload.to_payload_bytes()?);
        Ok(buf)
    }

    /// Body Digest Components.
    ///
    /// NOTE: This function uses a library to do Keccak256 hashing, but on-chain this may not be
    /// efficient. If efficiency is needed, consider calling `to_bytes` instead and hashing the
    /// result using on-chain primitives.
    #[inline]
    pub fn digest(&self) -> anyhow::Result<Digest> {
        let body = self.to_bytes().context("failed to serialize body")?;
        digest(&body).context("failed to compute digest")
    }
}

#[cfg(test)]
mod test {
    use crate::token::{Action, GovernancePacket};

    use super::*;

    const ARBITRARY: &str = "01000000000100e29d3ad180b153d68c3f445d75eaa62fcc99690945baaf4ad0463e9c\
        e44f27f75da3d49f79722920aac81ba2be80f688895f174942fedc403bc4e5ce3555b77b0062b9f79100000000\
        0002000000000000000000000000f19a2a01b70519f67adb309a994ec8c69a967e8b0000000000000000014672\
        6f6d3a2065766d305c6e4d73673a2048656c6c6f20576f726c6421";

    const GOVERNANCE_BODY: &str = "00000001000000010001000000000000000000000000000000000000000000\
        00000000000000000000040000000003b456b800000000000000000000000000000000000000000000546f6b65\
        6e42726964676501000000020000000000000000000000000290fb167208af455bb137780163b7b7a9a10c16";

    #[test]
    fn arbitrary_payload() {
        let buf = hex::decode(ARBITRARY).unwrap();

        let mut r = [0u8; 32];
        r.copy_from_slice(&buf[7..39]);
        let mut s = [0u8; 32];
        s.copy_from_slice(&buf[39..71]);

        let mut emitter = [0u8; 32];
        emitter.copy_from_slice(&buf[82..114]);

        let vaa = Vaa {
            version: 1,
            guardian_set_index: 0,
            signatures: vec![Signature {
                index: 0,
                r,
                s,
                recovery_id: 0,
            }],
            timestamp: 1_656_354_705,
            nonce: 0,
            emitter_chain: Chain::Ethereum,
            emitter_address: UniversalAddress(emitter),
            sequence: 0,
            consistency_level: 1,
            payload: b"From: evm0\\nMsg: Hello World!".to_vec(),
        };

        assert_eq!(&buf[123..], &vaa.payload[..]);
        assert_eq!(vaa, Vaa::<Vec<u8>>::from_bytes(&buf).unwrap());
        assert_eq!(buf, vaa.to_bytes().unwrap());
        assert_eq!(&buf[72..], &vaa.body_bytes().unwrap()[..]);
        assert!(!vaa.is_governance());
    }

    #[test]
    fn digest_from_raw_parts() {
        let buf = hex::decode(ARBITRARY).unwrap();
        let vaa = Vaa::<Vec<u8>>::from_bytes(&buf).unwrap();

        let d1 = vaa.digest().unwrap();
        let d2 = digest(&buf[72..]).unwrap();
        assert_eq!(d1, d2);

        let (_, body): (Header, Body) = vaa.into();
        assert_eq!(d1, body.digest().unwrap());
    }

    #[test]
    fn digest_is_deterministic() {
        let data = hex::decode(GOVERNANCE_BODY).unwrap();

        let d1 = digest(&data).unwrap();
        let d2 = digest(&data).unwrap();
        assert_eq!(d1, d2);
        assert_eq!(d1.secp256k_hash, double_hash(&d1.hash).unwrap());
        assert_ne!(d1.hash, d1.secp256k_hash);
    }

    #[test]
    fn stable_digest() {
        let data = hex::decode(GOVERNANCE_BODY).unwrap();

        let expected_digest = hex::decode(
            "05d1fcc531746c7efd7feea20a81d2799f777f302b8a6a6424b81209dc3f511f",
        )
        .unwrap();

        assert_eq!(expected_digest, digest(&data).unwrap().secp256k_hash);

        let mut emitter_address = [0u8; 32];
        emitter_address[12..].copy_from_slice(
            &hex::decode("0290fb167208af455bb137780163b7b7a9a10c16").unwrap(),
        );

        let expected_body = Body {
            timestamp: 1,
            nonce: 1,
            emitter_chain: Chain::Solana,
            emitter_address: GOVERNANCE_EMITTER,
            sequence: 62150328,
            consistency_level: 0,
            payload: GovernancePacket {
                chain: Chain::Any,
                action: Action::RegisterChain {
                    chain: Chain::Ethereum,
                    emitter_address: UniversalAddress(emitter_address),
                },
            },
        };

        let body = Body::<GovernancePacket>::from_bytes(&data).unwrap();
        assert_eq!(expected_body, body);
        assert_eq!(data, body.to_bytes().unwrap());
        assert_eq!(expected_digest, body.digest().unwrap().secp256k_hash);

        // Deferred parsing of the payload should still produce the same digest.
        let body = Body::<Vec<u8>>::from_bytes(&data).unwrap();
        assert_eq!(&data[51..], &body.payload[..]);
        assert_eq!(expected_digest, body.digest().unwrap().secp256k_hash);
    }

    #[test]
    fn deferred_payload() {
        let data = hex::decode(GOVERNANCE_BODY).unwrap();
        let body = Body::<Vec<u8>>::from_bytes(&data).unwrap();

        let vaa: Vaa = (Header::default(), body).into();
        assert!(vaa.is_governance());

        let vaa = vaa.parse_payload::<GovernancePacket>().unwrap();
        assert_eq!(Chain::Any, vaa.payload.chain);
        assert_eq!(62150328, vaa.message_id().sequence);
    }

    #[test]
    fn truncated_vaa() {
        let buf = hex::decode(ARBITRARY).unwrap();

        assert!(Vaa::<Vec<u8>>::from_bytes(&buf[..100]).is_err());
        assert!(Vaa::<Vec<u8>>::from_bytes(&[]).is_err());
    }
}
