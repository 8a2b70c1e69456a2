//! Typed device inventory for batch task dispatch.
//!
//! An inventory is an ordered collection of declared hosts with connection
//! parameters, plus arbitrary groups and variables the protocol carries
//! opaquely as [`PayloadValue`]s. On the wire it uses the same
//! postcard-then-base64 pipeline as the payload codec, so decoding untrusted
//! input is bounded to this schema.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ProtoError, Result};
use crate::payload::PayloadValue;

/// Maximum serialized inventory size (1 MiB), before base64 expansion.
pub const MAX_INVENTORY_SIZE: usize = 1024 * 1024;

/// A declared device inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    /// Hosts in declaration order.
    pub hosts: Vec<Host>,
    /// Declared groups, opaque to this layer.
    pub groups: Vec<Group>,
    /// Inventory-wide default variables.
    pub defaults: PayloadValue,
}

/// One device entry in an inventory.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub name: String,
    pub address: String,
    pub platform: String,
    pub username: String,
    pub password: String,
    /// Names of groups this host belongs to.
    pub groups: Vec<String>,
    /// Arbitrary declared variables for this host.
    pub data: PayloadValue,
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("platform", &self.platform)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("groups", &self.groups)
            .field("data", &self.data)
            .finish()
    }
}

/// A named host group with its declared variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub data: PayloadValue,
}

impl Inventory {
    /// Every host must declare a non-empty address before any session could
    /// be opened against it.
    pub fn validate(&self) -> Result<()> {
        for (index, host) in self.hosts.iter().enumerate() {
            if host.address.is_empty() {
                return Err(ProtoError::InventoryHostEmptyAddress { index });
            }
        }
        Ok(())
    }
}

/// Encode a validated inventory as a transport-safe text blob.
pub fn encode(inventory: &Inventory) -> Result<String> {
    inventory.validate()?;
    let bytes = postcard::to_stdvec(inventory).map_err(ProtoError::PayloadEncode)?;
    if bytes.len() > MAX_INVENTORY_SIZE {
        return Err(ProtoError::PayloadTooLarge {
            size: bytes.len(),
            max: MAX_INVENTORY_SIZE,
        });
    }
    Ok(BASE64.encode(bytes))
}

/// Decode and validate an inventory from its text encoding.
pub fn decode(encoded: &str) -> Result<Inventory> {
    let bytes = BASE64.decode(encoded)?;
    if bytes.len() > MAX_INVENTORY_SIZE {
        return Err(ProtoError::PayloadTooLarge {
            size: bytes.len(),
            max: MAX_INVENTORY_SIZE,
        });
    }
    let inventory: Inventory =
        postcard::from_bytes(&bytes).map_err(ProtoError::PayloadDecode)?;
    inventory.validate()?;
    Ok(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_host(name: &str, address: &str) -> Host {
        Host {
            name: name.into(),
            address: address.into(),
            platform: "cisco_ios".into(),
            username: "admin".into(),
            password: "secret".into(),
            groups: vec!["core".into()],
            data: PayloadValue::Map(vec![(
                "site".into(),
                PayloadValue::Text("lab".into()),
            )]),
        }
    }

    fn sample_inventory() -> Inventory {
        Inventory {
            hosts: vec![sample_host("r1", "192.0.2.1"), sample_host("r2", "192.0.2.2")],
            groups: vec![Group {
                name: "core".into(),
                data: PayloadValue::Null,
            }],
            defaults: PayloadValue::Map(vec![(
                "timeout".into(),
                PayloadValue::Int(30),
            )]),
        }
    }

    #[test]
    fn inventory_roundtrips() {
        let inventory = sample_inventory();
        let decoded = decode(&encode(&inventory).expect("encode")).expect("decode");
        assert_eq!(decoded, inventory);
    }

    #[test]
    fn host_order_is_preserved() {
        let decoded = decode(&encode(&sample_inventory()).unwrap()).unwrap();
        assert_eq!(decoded.hosts[0].name, "r1");
        assert_eq!(decoded.hosts[1].name, "r2");
    }

    #[test]
    fn empty_host_address_rejected() {
        let mut inventory = sample_inventory();
        inventory.hosts[1].address.clear();
        let encoded = {
            // Bypass encode-side validation to exercise the decode path.
            let bytes = postcard::to_stdvec(&inventory).unwrap();
            BASE64.encode(bytes)
        };
        assert!(matches!(
            decode(&encoded),
            Err(ProtoError::InventoryHostEmptyAddress { index: 1 })
        ));
    }

    #[test]
    fn malformed_encoding_rejected() {
        assert!(decode("@@@").is_err());
        let garbage = BASE64.encode([1, 2, 3]);
        assert!(decode(&garbage).is_err());
    }

    #[test]
    fn hostile_deep_defaults_rejected_at_decode() {
        // Raw bytes for an inventory with no hosts or groups and deeply
        // nested list defaults: well under the size cap, but the payload
        // depth cap must stop it while the value is being read.
        let mut bytes = vec![0x00, 0x00];
        for _ in 0..130_000 {
            bytes.extend_from_slice(&[6, 1]);
        }
        bytes.push(0); // innermost Null
        assert!(bytes.len() <= MAX_INVENTORY_SIZE);
        let encoded = BASE64.encode(&bytes);
        assert!(matches!(
            decode(&encoded),
            Err(ProtoError::PayloadDecode(_))
        ));
    }

    #[test]
    fn host_debug_redacts_password() {
        let rendered = format!("{:?}", sample_host("r1", "192.0.2.1"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
