// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembler: the fixed section order of a recovery sheet.
//
// The gating rules live here once; HTML and PDF output differ only in how a
// `SheetWriter` turns each block into markup or drawing operations.

use tracing::{debug, info, instrument};
use walletsheet_core::error::Result;
use walletsheet_core::types::{ExtraInfoItem, SecretField};

use crate::model::{PublicKeyEntry, RenderModel};

pub(crate) const BACKUP_INFO_HEADING: &str = "Backup Info";
pub(crate) const PAGE_TWO_HEADING: &str = "Backup Info - part 2";
pub(crate) const PAGE_TWO_WARNING: &str =
    "This page needs to be replaced / updated when wallet password is changed!";
pub(crate) const INSTRUCTIONS_HEADING: &str = "Wallet Recovery Instructions";
pub(crate) const INSTRUCTIONS: &str = "You can recover the funds in your wallet on https://recovery.blocktrail.com using this backup sheet.\n\
For a more technical approach on how to recover your wallet yourself, see the 'wallet_recovery_example.php' script in the examples folder of the Blocktrail SDK.";
pub(crate) const PUBLIC_KEYS_HEADING: &str = "Wallet Public Keys";

/// Sheet title for a network.
pub fn title(network: &str) -> String {
    format!("{network} Wallet Recovery Data Sheet")
}

fn disclaimer(network: &str) -> String {
    format!(
        "This document holds the information and instructions required for you to recover your {network} wallet should anything happen.\n\
         Print it out and keep it in a safe location; if you lose these details you will never be able to recover your wallet."
    )
}

fn identifier_heading(wallet_version: Option<&str>) -> String {
    match wallet_version {
        Some(version) => format!("Wallet Identifier ({version})"),
        None => "Wallet Identifier".to_owned(),
    }
}

/// Output-specific rendering of the sheet's building blocks.
pub trait SheetWriter {
    /// Large text, no rule.
    fn title(&mut self, text: &str) -> Result<()>;

    /// Large text followed by a horizontal rule.
    fn heading(&mut self, text: &str) -> Result<()>;

    /// Body text.
    fn paragraph(&mut self, text: &str) -> Result<()>;

    /// Prominent grey value (the wallet identifier).
    fn emphasis(&mut self, text: &str) -> Result<()>;

    /// Grey label with its value underneath.
    fn field(&mut self, label: &str, value: &str) -> Result<()>;

    /// The public key block: heading, key count, QR tile grid.
    fn public_keys(&mut self, heading: &str, keys: &[PublicKeyEntry]) -> Result<()>;

    /// One extra annotation.
    fn extra_info(&mut self, item: &ExtraInfoItem) -> Result<()>;

    fn page_break(&mut self) -> Result<()>;
}

/// Which gated sections made it into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderedSections {
    pub page1: bool,
    pub page2: bool,
    pub page3: bool,
}

/// Write the sheet's sections, in order, through `writer`.
///
/// The page header is the writer's concern: it appears on every page the
/// writer starts.
#[instrument(skip_all, fields(identifier = model.identifier()))]
pub fn assemble<W: SheetWriter>(model: &RenderModel, writer: &mut W) -> Result<RenderedSections> {
    let options = model.options();
    let mut sections = RenderedSections::default();

    if options.page1 {
        write_page_one(model, writer)?;
        sections.page1 = true;
    }

    if model.shows_page2() {
        if sections.page1 {
            writer.page_break()?;
        }
        writer.heading(PAGE_TWO_HEADING)?;
        writer.paragraph(PAGE_TWO_WARNING)?;
        if let Some(secret) = model.backup().secret(SecretField::EncryptedSecret) {
            writer.field(SecretField::EncryptedSecret.label(), secret)?;
        }
        sections.page2 = true;
    } else {
        debug!(
            option = options.page2,
            "Skipping page 2 (disabled or no encrypted secret)"
        );
    }

    // Shares the page with whatever came before.
    if options.page3 {
        writer.heading(INSTRUCTIONS_HEADING)?;
        writer.paragraph(INSTRUCTIONS)?;
        sections.page3 = true;
    }

    info!(?sections, "Sheet assembled");
    Ok(sections)
}

fn write_page_one<W: SheetWriter>(model: &RenderModel, writer: &mut W) -> Result<()> {
    let network = &model.options().network;

    writer.title(&title(network))?;
    writer.paragraph(&disclaimer(network))?;

    writer.heading(&identifier_heading(
        model.backup().wallet_version.as_deref(),
    ))?;
    writer.emphasis(model.identifier())?;

    writer.heading(BACKUP_INFO_HEADING)?;
    for (field, value) in model.page_one_secrets() {
        writer.field(field.label(), value)?;
    }

    writer.page_break()?;
    writer.public_keys(PUBLIC_KEYS_HEADING, model.public_keys())?;

    for item in model.extra_info() {
        writer.extra_info(item)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use walletsheet_core::config::{RenderOptions, RenderOverrides};
    use walletsheet_core::types::{BackupInfo, ExtraInfoEntry};

    /// Writer that logs each block as a line of text.
    #[derive(Default)]
    struct Outline(Vec<String>);

    impl SheetWriter for Outline {
        fn title(&mut self, text: &str) -> Result<()> {
            self.0.push(format!("title:{text}"));
            Ok(())
        }
        fn heading(&mut self, text: &str) -> Result<()> {
            self.0.push(format!("heading:{text}"));
            Ok(())
        }
        fn paragraph(&mut self, _text: &str) -> Result<()> {
            self.0.push("paragraph".into());
            Ok(())
        }
        fn emphasis(&mut self, text: &str) -> Result<()> {
            self.0.push(format!("emphasis:{text}"));
            Ok(())
        }
        fn field(&mut self, label: &str, _value: &str) -> Result<()> {
            self.0.push(format!("field:{label}"));
            Ok(())
        }
        fn public_keys(&mut self, _heading: &str, keys: &[PublicKeyEntry]) -> Result<()> {
            self.0.push(format!("keys:{}", keys.len()));
            Ok(())
        }
        fn extra_info(&mut self, item: &ExtraInfoItem) -> Result<()> {
            self.0.push(format!("extra:{}", item.title));
            Ok(())
        }
        fn page_break(&mut self) -> Result<()> {
            self.0.push("break".into());
            Ok(())
        }
    }

    fn full_backup() -> BackupInfo {
        BackupInfo {
            wallet_version: Some("v3".into()),
            ..BackupInfo::new()
        }
        .with_secret(SecretField::RecoveryEncryptedSecret, "recovery words")
        .with_secret(SecretField::PrimaryMnemonic, "primary words")
        .with_secret(SecretField::BackupSeed, "backup words")
        .with_secret(SecretField::EncryptedSecret, "password words")
        .with_public_key(9999, "tpub-a".to_string())
    }

    fn outline(backup: BackupInfo, overrides: RenderOverrides) -> (Vec<String>, RenderedSections) {
        let extra = vec![("Note".to_string(), ExtraInfoEntry::Bare("kept in a safe".into()))];
        let model = RenderModel::build("wallet-1", backup, extra, RenderOptions::merged(overrides));
        let mut writer = Outline::default();
        let sections = assemble(&model, &mut writer).unwrap();
        (writer.0, sections)
    }

    #[test]
    fn full_sheet_follows_fixed_order() {
        let (lines, sections) = outline(full_backup(), RenderOverrides::default());
        assert_eq!(
            lines,
            vec![
                "title:Bitcoin Wallet Recovery Data Sheet",
                "paragraph",
                "heading:Wallet Identifier (v3)",
                "emphasis:wallet-1",
                "heading:Backup Info",
                "field:Primary Mnemonic",
                "field:Backup Seed",
                "field:Encrypted Recovery Secret",
                "break",
                "keys:1",
                "extra:Note",
                "break",
                "heading:Backup Info - part 2",
                "paragraph",
                "field:Password Encrypted Secret",
                "heading:Wallet Recovery Instructions",
                "paragraph",
            ]
        );
        assert_eq!(
            sections,
            RenderedSections {
                page1: true,
                page2: true,
                page3: true
            }
        );
    }

    #[test]
    fn page_two_without_page_one_does_not_break() {
        let (lines, _) = outline(
            full_backup(),
            RenderOverrides {
                page1: Some(false),
                ..Default::default()
            },
        );
        assert_eq!(lines[0], "heading:Backup Info - part 2");
        assert!(!lines.contains(&"break".to_string()));
    }

    #[test]
    fn page_two_is_gated_by_option_and_secret() {
        let disabled = RenderOverrides {
            page2: Some(false),
            ..Default::default()
        };
        let mut no_secret = full_backup();
        no_secret.encrypted_secret = None;

        for (backup, overrides) in [
            (full_backup(), disabled.clone()),
            (no_secret.clone(), RenderOverrides::default()),
            (no_secret, disabled),
        ] {
            let (lines, sections) = outline(backup, overrides);
            assert!(!sections.page2);
            assert!(!lines.iter().any(|l| l.contains("part 2")));
            assert_eq!(lines.iter().filter(|l| *l == "break").count(), 1);
        }
    }

    #[test]
    fn identifier_heading_without_version() {
        let (lines, _) = outline(BackupInfo::new(), RenderOverrides::default());
        assert!(lines.contains(&"heading:Wallet Identifier".to_string()));
        assert!(lines.contains(&"keys:0".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("field:")));
    }

    #[test]
    fn everything_disabled_writes_nothing() {
        let (lines, sections) = outline(
            full_backup(),
            RenderOverrides {
                page1: Some(false),
                page2: Some(false),
                page3: Some(false),
                ..Default::default()
            },
        );
        assert!(lines.is_empty());
        assert_eq!(sections, RenderedSections::default());
    }
}
