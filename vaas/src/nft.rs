//! NFT bridge payloads.
//!
//! The NFT bridge moves a single token of an ERC-721 style collection. Its only transfer payload
//! shares discriminator 1 with the token bridge transfer; governance uses the token bridge's
//! actions under the 32 byte module name "NFTBridge".

use bstr::BString;
use serde::{Deserialize, Serialize};

use crate::{token, Amount, Chain, Error, PayloadKind, UniversalAddress, VaaPayload};

/// `"NFTBridge"`, left padded to 32 bytes.
pub const MODULE: [u8; 32] =
    *b"\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00NFTBridge";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transfer {
    /// The collection's address on its chain of origin.
    pub nft_address: UniversalAddress,
    pub nft_chain: Chain,
    #[serde(with = "crate::arraystring")]
    pub symbol: BString,
    #[serde(with = "crate::arraystring")]
    pub name: BString,
    /// A uint256, big-endian.
    pub token_id: Amount,
    /// Metadata URI, length prefixed with a single byte.
    pub uri: String,
    pub to: UniversalAddress,
    pub to_chain: Chain,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Message {
    #[serde(rename = "1")]
    Transfer(Transfer),
}

impl Message {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Message::Transfer(_) => PayloadKind::NftTransfer,
        }
    }
}

impl VaaPayload for Message {
    fn to_payload_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_wormhole::to_vec(self)?)
    }

    fn from_payload_bytes(buf: &[u8]) -> Result<Self, Error> {
        match buf.first() {
            None => return Err(Error::EmptyPayload),
            Some(1) => {}
            Some(&k) => return Err(Error::UnknownPayloadKind(k)),
        }

        let (msg, rest) = serde_wormhole::from_slice_with_payload::<Message>(buf)?;
        if !rest.is_empty() {
            return Err(Error::TrailingData(msg.kind()));
        }

        Ok(msg)
    }
}

/// An NFT bridge governance instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GovernancePacket(pub token::GovernancePacket);

impl GovernancePacket {
    pub fn kind(&self) -> PayloadKind {
        self.0.kind()
    }
}

impl VaaPayload for GovernancePacket {
    fn to_payload_bytes(&self) -> Result<Vec<u8>, Error> {
        self.0.encode(MODULE)
    }

    fn from_payload_bytes(buf: &[u8]) -> Result<Self, Error> {
        token::GovernancePacket::decode(MODULE, buf).map(GovernancePacket)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::Action;

    fn transfer() -> Transfer {
        Transfer {
            nft_address: UniversalAddress([0x11; 32]),
            nft_chain: Chain::Ethereum,
            symbol: "APE".into(),
            name: "Bored Ape Yacht Club".into(),
            token_id: Amount::from(4_321u128),
            uri: "ipfs://QmeSjSinHpPnmXmspMjwiXyN6zS4E9zccariGR3jxcaWtq/4321".into(),
            to: UniversalAddress([0x22; 32]),
            to_chain: Chain::Solana,
        }
    }

    #[test]
    fn transfer_layout() {
        let msg = Message::Transfer(transfer());
        let uri_len = transfer().uri.len();

        let buf = msg.to_payload_bytes().unwrap();
        assert_eq!(1 + 32 + 2 + 32 + 32 + 32 + 1 + uri_len + 32 + 2, buf.len());
        assert_eq!(1, buf[0]);
        assert_eq!(&[0x00, 0x02], &buf[33..35]);
        assert_eq!(b"APE", &buf[35..38]);
        assert_eq!(&[0x10, 0xe1], &buf[129..131]);
        assert_eq!(uri_len, usize::from(buf[131]));
        assert_eq!(&[0x00, 0x01], &buf[buf.len() - 2..]);

        assert_eq!(msg, Message::from_payload_bytes(&buf).unwrap());
    }

    #[test]
    fn transfer_rejects_trailing_data() {
        let mut buf = Message::Transfer(transfer()).to_payload_bytes().unwrap();
        buf.push(0);

        assert!(matches!(
            Message::from_payload_bytes(&buf),
            Err(Error::TrailingData(PayloadKind::NftTransfer))
        ));
    }

    #[test]
    fn unknown_discriminator() {
        assert!(matches!(
            Message::from_payload_bytes(&[3, 0]),
            Err(Error::UnknownPayloadKind(3))
        ));
        assert!(matches!(
            Message::from_payload_bytes(&[]),
            Err(Error::EmptyPayload)
        ));
    }

    #[test]
    fn register_chain() {
        let packet = GovernancePacket(token::GovernancePacket {
            chain: Chain::Any,
            action: Action::RegisterChain {
                chain: Chain::Polygon,
                emitter_address: UniversalAddress([0x5a; 32]),
            },
        });

        let buf = packet.to_payload_bytes().unwrap();
        assert_eq!(&MODULE[..], &buf[..32]);
        assert!(buf[..32].ends_with(b"NFTBridge"));
        assert_eq!(1, buf[32]);
        assert_eq!(&[0x00, 0x00], &buf[33..35]);
        assert_eq!(&[0x00, 0x05], &buf[35..37]);

        assert_eq!(packet, GovernancePacket::from_payload_bytes(&buf).unwrap());
        assert_eq!(PayloadKind::RegisterChain, packet.kind());
    }

    #[test]
    fn modules_are_not_interchangeable() {
        let packet = token::GovernancePacket {
            chain: Chain::Ethereum,
            action: Action::ContractUpgrade {
                new_contract: UniversalAddress([0x0c; 32]),
            },
        };

        let nft = GovernancePacket(packet.clone()).to_payload_bytes().unwrap();
        assert!(matches!(
            token::GovernancePacket::from_payload_bytes(&nft),
            Err(Error::UnknownModule)
        ));

        let tb = packet.to_payload_bytes().unwrap();
        assert!(matches!(
            GovernancePacket::from_payload_bytes(&tb),
            Err(Error::UnknownModule)
        ));
    }
}
