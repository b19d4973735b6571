// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render model: the canonical, render-ready view of one recovery sheet.
//
// Raw backup data (typed or JSON) and extra annotations are normalized once
// here; both output backends read only from the resulting `RenderModel`.

use std::sync::OnceLock;

use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument};
use walletsheet_core::config::{RenderOptions, RenderOverrides};
use walletsheet_core::error::{Result, SheetError};
use walletsheet_core::types::{BackupInfo, ExtraInfoEntry, ExtraInfoItem, SecretField};

use crate::qr::{QrEncoder, QrImage};

/// JSON key holding the key-index → public key mapping.
const PUBLIC_KEYS_KEY: &str = "blocktrailPublicKeys";

/// One public key as it appears on the sheet.
#[derive(Debug)]
pub struct PublicKeyEntry {
    key_index: u32,
    serialized_key: String,
    derivation_path: String,
    qr: OnceLock<QrImage>,
}

impl PublicKeyEntry {
    pub fn new(key_index: u32, serialized_key: impl Into<String>) -> Self {
        Self {
            key_index,
            serialized_key: serialized_key.into(),
            derivation_path: format!("M/{key_index}'"),
            qr: OnceLock::new(),
        }
    }

    pub fn key_index(&self) -> u32 {
        self.key_index
    }

    pub fn serialized_key(&self) -> &str {
        &self.serialized_key
    }

    pub fn derivation_path(&self) -> &str {
        &self.derivation_path
    }

    /// Caption printed under the QR tile.
    pub fn caption(&self) -> String {
        format!("KeyIndex: {} Path: {}", self.key_index, self.derivation_path)
    }

    /// The QR image, encoding it on first use. Later calls return the cached
    /// image.
    pub fn qr_image(&self, encoder: &QrEncoder) -> Result<&QrImage> {
        if let Some(image) = self.qr.get() {
            return Ok(image);
        }
        let image = encoder.encode(&self.serialized_key)?;
        Ok(self.qr.get_or_init(|| image))
    }

    /// The QR image if it has already been encoded.
    pub fn cached_qr_image(&self) -> Option<&QrImage> {
        self.qr.get()
    }

    fn store_qr_image(&self, image: QrImage) {
        // First writer wins; a concurrent encode of the same text is identical.
        let _ = self.qr.set(image);
    }
}

/// Everything needed to draw one sheet.
#[derive(Debug)]
pub struct RenderModel {
    identifier: String,
    backup: BackupInfo,
    public_keys: Vec<PublicKeyEntry>,
    extra_info: Vec<ExtraInfoItem>,
    options: RenderOptions,
}

impl RenderModel {
    /// Normalize typed inputs. Never fails: absent fields stay absent.
    ///
    /// Public keys keep the order of `backup.public_keys`; extra info keeps
    /// input order and is normalized to the structured form.
    #[instrument(skip_all, fields(keys = backup.public_keys.len(), extra = extra_info.len()))]
    pub fn build(
        identifier: impl Into<String>,
        backup: BackupInfo,
        extra_info: Vec<(String, ExtraInfoEntry)>,
        options: RenderOptions,
    ) -> Self {
        let public_keys = backup
            .public_keys
            .iter()
            .map(|(key_index, key)| PublicKeyEntry::new(*key_index, key.to_display_string()))
            .collect();

        let extra_info = extra_info
            .into_iter()
            .map(|(label, entry)| ExtraInfoItem::from_entry(&label, entry))
            .collect();

        Self {
            identifier: identifier.into(),
            backup,
            public_keys,
            extra_info,
            options,
        }
    }

    /// Normalize raw JSON inputs, merging `overrides` over the default
    /// options.
    pub fn from_json(
        identifier: impl Into<String>,
        backup: &Value,
        extra_info: &Value,
        overrides: RenderOverrides,
    ) -> Result<Self> {
        let backup = backup_info_from_json(backup)?;
        let extra_info = extra_info_from_json(extra_info)?;
        Ok(Self::build(
            identifier,
            backup,
            extra_info,
            RenderOptions::merged(overrides),
        ))
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn backup(&self) -> &BackupInfo {
        &self.backup
    }

    pub fn public_keys(&self) -> &[PublicKeyEntry] {
        &self.public_keys
    }

    pub fn extra_info(&self) -> &[ExtraInfoItem] {
        &self.extra_info
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Page 2 needs both the option and a non-empty encrypted secret.
    pub fn shows_page2(&self) -> bool {
        self.options.page2 && self.backup.secret(SecretField::EncryptedSecret).is_some()
    }

    /// Secrets printed in the "Backup Info" block, in print order, skipping
    /// absent ones.
    pub fn page_one_secrets(&self) -> impl Iterator<Item = (SecretField, &str)> {
        SecretField::PAGE_ONE
            .into_iter()
            .filter_map(|field| self.backup.secret(field).map(|value| (field, value)))
    }

    /// Encoder configured from the render options.
    pub fn qr_encoder(&self) -> QrEncoder {
        QrEncoder::new(self.options.qr_error_correction)
    }

    /// Encode every missing QR image, one after another.
    pub fn encode_qr_codes(&self, encoder: &QrEncoder) -> Result<()> {
        for entry in &self.public_keys {
            entry.qr_image(encoder)?;
        }
        Ok(())
    }

    /// Encode every missing QR image on the blocking pool and wait for all
    /// of them. The first failure aborts the remaining encodings.
    #[instrument(skip_all, fields(keys = self.public_keys.len()))]
    pub async fn encode_qr_codes_concurrently(&self, encoder: &QrEncoder) -> Result<()> {
        let mut tasks = JoinSet::new();
        for (position, entry) in self.public_keys.iter().enumerate() {
            if entry.cached_qr_image().is_some() {
                continue;
            }
            let encoder = *encoder;
            let text = entry.serialized_key.clone();
            tasks.spawn_blocking(move || (position, encoder.encode(&text)));
        }

        let pending = tasks.len();
        while let Some(joined) = tasks.join_next().await {
            let (position, encoded) = joined
                .map_err(|err| SheetError::RenderBackend(format!("QR encoding task failed: {err}")))?;
            self.public_keys[position].store_qr_image(encoded?);
        }

        info!(encoded = pending, "QR codes ready");
        Ok(())
    }
}

/// Parse backup data from JSON.
///
/// Unknown fields are ignored and missing or non-string secrets are absent.
/// The public key mapping, when present, must be an object whose keys are
/// non-negative integers and whose values are serialized keys.
pub fn backup_info_from_json(value: &Value) -> Result<BackupInfo> {
    let Some(object) = value.as_object() else {
        if value.is_null() {
            return Ok(BackupInfo::new());
        }
        return Err(SheetError::InvalidInput(
            "backup info must be a JSON object".into(),
        ));
    };

    let mut backup = BackupInfo::new();
    backup.wallet_version = match object.get("walletVersion") {
        Some(Value::String(version)) => Some(version.clone()),
        Some(Value::Number(version)) => Some(version.to_string()),
        _ => None,
    };

    for field in SecretField::PAGE_ONE
        .into_iter()
        .chain(std::iter::once(SecretField::EncryptedSecret))
    {
        if let Some(Value::String(secret)) = object.get(field.json_key()) {
            backup.set_secret(field, secret.as_str());
        }
    }

    match object.get(PUBLIC_KEYS_KEY) {
        None | Some(Value::Null) => {}
        Some(Value::Object(keys)) => {
            for (key_index, key) in keys {
                let index: u32 = key_index.parse().map_err(|_| {
                    SheetError::InvalidInput(format!(
                        "{PUBLIC_KEYS_KEY}: key index {key_index:?} is not a non-negative integer"
                    ))
                })?;
                let Value::String(serialized) = key else {
                    return Err(SheetError::InvalidInput(format!(
                        "{PUBLIC_KEYS_KEY}: key {index} is not a serialized key string"
                    )));
                };
                backup = backup.with_public_key(index, serialized.clone());
            }
        }
        Some(other) => {
            return Err(SheetError::InvalidInput(format!(
                "{PUBLIC_KEYS_KEY} must be a key index mapping, got {}",
                json_kind(other)
            )));
        }
    }

    debug!(?backup, "Backup info parsed");
    Ok(backup)
}

/// Parse extra annotations from JSON.
///
/// Accepts an object (label → value) or an array (position → value). Each
/// value is either a bare string or `{title, subtitle?, value}`.
pub fn extra_info_from_json(value: &Value) -> Result<Vec<(String, ExtraInfoEntry)>> {
    let entries: Vec<(String, &Value)> = match value {
        Value::Null => Vec::new(),
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        other => {
            return Err(SheetError::InvalidInput(format!(
                "extra info must be an object or array, got {}",
                json_kind(other)
            )));
        }
    };

    entries
        .into_iter()
        .map(|(label, raw)| {
            let entry = serde_json::from_value::<ExtraInfoEntry>(raw.clone()).map_err(|err| {
                SheetError::InvalidInput(format!("extra info {label:?}: {err}"))
            })?;
            Ok((label, entry))
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
