// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for recovery sheets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A wallet public key as far as the sheet is concerned: something that can
/// be serialized to the string that ends up inside the QR code.
pub trait PublicKeyHandle: Send + Sync {
    /// Serialized display form (e.g. a base58 extended public key).
    fn to_display_string(&self) -> String;
}

impl PublicKeyHandle for String {
    fn to_display_string(&self) -> String {
        self.clone()
    }
}

/// The secret fields a backup may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretField {
    PrimaryMnemonic,
    BackupMnemonic,
    EncryptedPrimarySeed,
    BackupSeed,
    RecoveryEncryptedSecret,
    /// Password-encrypted secret, printed on its own page because it changes
    /// whenever the wallet password does.
    EncryptedSecret,
}

impl SecretField {
    /// Fields printed in the "Backup Info" block, in print order.
    pub const PAGE_ONE: [SecretField; 5] = [
        Self::PrimaryMnemonic,
        Self::BackupMnemonic,
        Self::EncryptedPrimarySeed,
        Self::BackupSeed,
        Self::RecoveryEncryptedSecret,
    ];

    /// Label printed above the value.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PrimaryMnemonic => "Primary Mnemonic",
            Self::BackupMnemonic => "Backup Mnemonic",
            Self::EncryptedPrimarySeed => "Encrypted Primary Seed",
            Self::BackupSeed => "Backup Seed",
            Self::RecoveryEncryptedSecret => "Encrypted Recovery Secret",
            Self::EncryptedSecret => "Password Encrypted Secret",
        }
    }

    /// Key used for this field in JSON backup data.
    pub fn json_key(&self) -> &'static str {
        match self {
            Self::PrimaryMnemonic => "primaryMnemonic",
            Self::BackupMnemonic => "backupMnemonic",
            Self::EncryptedPrimarySeed => "encryptedPrimarySeed",
            Self::BackupSeed => "backupSeed",
            Self::RecoveryEncryptedSecret => "recoveryEncryptedSecret",
            Self::EncryptedSecret => "encryptedSecret",
        }
    }
}

/// Raw backup data supplied by the caller.
///
/// Public keys keep the order they were inserted in; that order is the tile
/// order on the sheet.
#[derive(Clone, Default)]
pub struct BackupInfo {
    pub wallet_version: Option<String>,
    pub primary_mnemonic: Option<String>,
    pub backup_mnemonic: Option<String>,
    pub encrypted_primary_seed: Option<String>,
    pub backup_seed: Option<String>,
    pub recovery_encrypted_secret: Option<String>,
    pub encrypted_secret: Option<String>,
    pub public_keys: Vec<(u32, Arc<dyn PublicKeyHandle>)>,
}

impl BackupInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a secret field. Empty strings are stored as absent.
    pub fn set_secret(&mut self, field: SecretField, value: impl Into<String>) {
        let value = Some(value.into()).filter(|v| !v.is_empty());
        match field {
            SecretField::PrimaryMnemonic => self.primary_mnemonic = value,
            SecretField::BackupMnemonic => self.backup_mnemonic = value,
            SecretField::EncryptedPrimarySeed => self.encrypted_primary_seed = value,
            SecretField::BackupSeed => self.backup_seed = value,
            SecretField::RecoveryEncryptedSecret => self.recovery_encrypted_secret = value,
            SecretField::EncryptedSecret => self.encrypted_secret = value,
        }
    }

    /// Builder form of [`BackupInfo::set_secret`].
    pub fn with_secret(mut self, field: SecretField, value: impl Into<String>) -> Self {
        self.set_secret(field, value);
        self
    }

    /// Add a public key. Re-using an index replaces the key in place, so the
    /// mapping stays one entry per index.
    pub fn with_public_key(mut self, key_index: u32, key: impl PublicKeyHandle + 'static) -> Self {
        let key: Arc<dyn PublicKeyHandle> = Arc::new(key);
        match self.public_keys.iter_mut().find(|(idx, _)| *idx == key_index) {
            Some(slot) => slot.1 = key,
            None => self.public_keys.push((key_index, key)),
        }
        self
    }

    /// Value of a secret field, treating empty strings as absent.
    pub fn secret(&self, field: SecretField) -> Option<&str> {
        let value = match field {
            SecretField::PrimaryMnemonic => &self.primary_mnemonic,
            SecretField::BackupMnemonic => &self.backup_mnemonic,
            SecretField::EncryptedPrimarySeed => &self.encrypted_primary_seed,
            SecretField::BackupSeed => &self.backup_seed,
            SecretField::RecoveryEncryptedSecret => &self.recovery_encrypted_secret,
            SecretField::EncryptedSecret => &self.encrypted_secret,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }
}

// Secrets never end up in logs.
impl fmt::Debug for BackupInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present: Vec<&str> = SecretField::PAGE_ONE
            .iter()
            .chain(std::iter::once(&SecretField::EncryptedSecret))
            .filter(|field| self.secret(**field).is_some())
            .map(|field| field.json_key())
            .collect();
        f.debug_struct("BackupInfo")
            .field("wallet_version", &self.wallet_version)
            .field("secrets", &present)
            .field(
                "public_keys",
                &self.public_keys.iter().map(|(idx, _)| *idx).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// One extra annotation as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraInfoEntry {
    /// A plain value; the label it was keyed by becomes the title.
    Bare(String),
    Structured {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtitle: Option<String>,
        value: String,
    },
}

/// Normalized extra annotation, ready to print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraInfoItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub value: String,
}

impl ExtraInfoItem {
    /// Normalize a caller entry keyed by `label`.
    pub fn from_entry(label: &str, entry: ExtraInfoEntry) -> Self {
        match entry {
            ExtraInfoEntry::Bare(value) => Self {
                title: label.to_owned(),
                subtitle: None,
                value,
            },
            ExtraInfoEntry::Structured {
                title,
                subtitle,
                value,
            } => Self {
                title,
                subtitle: subtitle.filter(|s| !s.is_empty()),
                value,
            },
        }
    }
}

/// QR error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrErrorCorrection {
    Low,
    #[default]
    Medium,
    Quartile,
    High,
}

/// Encoded image formats the sheet can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Infer the format from a MIME type.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Infer the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }
}

/// Reference to an embeddable image, held as a `data:` URL so the same value
/// can be dropped into HTML verbatim and decoded for PDF output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn from_data_url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a `data:<mime>;base64,<payload>` URL into its MIME type and
    /// base64 payload. Returns `None` for anything else.
    pub fn data_url_parts(&self) -> Option<(&str, &str)> {
        let rest = self.0.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime = header.strip_suffix(";base64")?;
        Some((mime, payload))
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    A4,
    A5,
    #[default]
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Dimensions in PDF points (1pt = 1/72 inch).
    pub fn dimensions_pt(&self) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        (w as f32 * 72.0 / 25.4, h as f32 * 72.0 / 25.4)
    }
}
