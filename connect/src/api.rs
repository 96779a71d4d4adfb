//! Off-chain attestation services: the guardian API serving signed VAAs and Circle's attestation
//! service. The HTTP clients are supplied by the caller through the traits below.

use tracing::{info, warn};
use wormhole_connect_vaas::{
    circle::{CircleAttestation, CircleMessage},
    Payload, Vaa, WormholeMessageId,
};

use crate::Error;

/// Serves guardian signed VAAs.
pub trait VaaProvider: Send + Sync {
    /// The serialized VAA for `id`, or `None` if the guardians haven't signed it yet.
    fn get_vaa_bytes(&self, id: &WormholeMessageId) -> Result<Option<Vec<u8>>, Error>;
}

/// Serves Circle's attestations for burn messages.
pub trait CircleAttestationProvider: Send + Sync {
    /// The attestation for the message hashing to `message_hash`, or `None` while it is pending.
    fn get_attestation(&self, message_hash: &[u8; 32]) -> Result<Option<CircleAttestation>, Error>;
}

/// REST path of a signed VAA, relative to the guardian API base URL.
pub fn vaa_path(id: &WormholeMessageId) -> String {
    format!(
        "/v1/signed_vaa/{}/{}/{}",
        u16::from(id.chain),
        id.emitter,
        id.sequence
    )
}

pub fn vaa_url(api: &str, id: &WormholeMessageId) -> String {
    format!("{}{}", api.trim_end_matches('/'), vaa_path(id))
}

/// REST path of a Circle attestation, relative to the attestation service base URL.
pub fn circle_attestation_path(message: &CircleMessage) -> String {
    format!("/v1/attestations/{}", message.hash_hex())
}

pub fn circle_attestation_url(api: &str, message: &CircleMessage) -> String {
    format!(
        "{}{}",
        api.trim_end_matches('/'),
        circle_attestation_path(message)
    )
}

/// Fetch and decode the VAA for `id`.
///
/// A missing VAA and a failed query both come back as [`Error::AttestationUnavailable`] so that a
/// polling caller simply tries again. A VAA that is not the one requested is
/// [`Error::AttestationMismatch`].
pub fn fetch_vaa(provider: &dyn VaaProvider, id: &WormholeMessageId) -> Result<Vaa<Payload>, Error> {
    let buf = match provider.get_vaa_bytes(id) {
        Ok(Some(buf)) => buf,
        Ok(None) => return Err(Error::AttestationUnavailable(format!("vaa {id}"))),
        Err(e) if e.is_transient() => {
            warn!(%id, error = %e, "vaa query failed, treating it as not yet available");
            return Err(Error::AttestationUnavailable(format!("vaa {id}")));
        }
        Err(e) => return Err(e),
    };

    let vaa = Vaa::<Payload>::from_bytes(&buf)?;
    if vaa.message_id() != *id {
        return Err(Error::AttestationMismatch(format!(
            "requested vaa {id}, received {}",
            vaa.message_id()
        )));
    }

    info!(%id, kind = %vaa.payload.kind(), "received vaa");
    Ok(vaa)
}

/// Fetch the attestation for `message`, with the same error rules as [`fetch_vaa`].
pub fn fetch_circle_attestation(
    provider: &dyn CircleAttestationProvider,
    message: &CircleMessage,
) -> Result<CircleAttestation, Error> {
    let hash = message.hash_hex();
    match provider.get_attestation(&message.hash()) {
        Ok(Some(attestation)) => {
            info!(message_hash = %hash, "received circle attestation");
            Ok(attestation)
        }
        Ok(None) => Err(Error::AttestationUnavailable(format!(
            "circle attestation {hash}"
        ))),
        Err(e) if e.is_transient() => {
            warn!(message_hash = %hash, error = %e, "circle attestation query failed, treating it as not yet available");
            Err(Error::AttestationUnavailable(format!(
                "circle attestation {hash}"
            )))
        }
        Err(e) => Err(e),
    }
}
