// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recovery sheet: the entry points that turn a render model into HTML or
// PDF output.

use std::path::Path;

use tracing::{info, instrument};
use walletsheet_core::error::Result;
use walletsheet_core::types::ImageFormat;

use crate::assemble::{self, RenderedSections};
use crate::dataurl;
use crate::flow::{DrawBackend, Flow, PageGeometry, PageHeader};
use crate::html::template::{HtmlTemplate, TemplateVars};
use crate::html::writer::{HtmlWriter, escape_attr, escape_text};
use crate::model::RenderModel;
use crate::pdf::backend::PdfBackend;
use crate::pdf::writer::FlowWriter;

/// Size the branding image is drawn at, in points.
pub const BRANDING_WIDTH: f32 = 154.0;
pub const BRANDING_HEIGHT: f32 = 30.0;

/// One recovery sheet, ready to render.
#[derive(Debug)]
pub struct RecoverySheet {
    model: RenderModel,
}

impl RecoverySheet {
    pub fn new(model: RenderModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &RenderModel {
        &self.model
    }

    /// Render into `template` as a single HTML string.
    ///
    /// The output depends only on the model, so rendering twice yields the
    /// same bytes.
    #[instrument(skip_all, fields(identifier = self.model.identifier(), template = template.name()))]
    pub fn render_html(&self, template: &HtmlTemplate) -> Result<String> {
        let encoder = self.model.qr_encoder();
        self.model.encode_qr_codes(&encoder)?;

        let options = self.model.options();
        let mut writer = HtmlWriter::new(options.branding_image.clone(), encoder);
        let sections = assemble::assemble(&self.model, &mut writer)?;
        let pages = writer.page_count();

        let mut vars = TemplateVars::new();
        vars.insert("title", escape_text(&assemble::title(&options.network)));
        vars.insert("identifier", escape_attr(self.model.identifier()));
        vars.insert(
            "total_public_keys",
            self.model.public_keys().len().to_string(),
        );
        vars.insert("pages", writer.finish());

        let html = template.render(&vars)?;
        info!(pages, ?sections, bytes = html.len(), "HTML sheet rendered");
        Ok(html)
    }

    /// Load the template at `path`, then render. A missing template fails
    /// before any QR code is encoded.
    pub fn render_html_from_path(&self, path: impl AsRef<Path>) -> Result<String> {
        let template = HtmlTemplate::load(path)?;
        self.render_html(&template)
    }

    /// Render the sheet as PDF bytes, encoding QR codes one after another.
    #[instrument(skip_all, fields(identifier = self.model.identifier()))]
    pub fn render_pdf(&self) -> Result<Vec<u8>> {
        self.model.encode_qr_codes(&self.model.qr_encoder())?;
        self.compose_pdf()
    }

    /// Render the sheet as PDF bytes, encoding all QR codes concurrently
    /// before layout starts.
    #[instrument(skip_all, fields(identifier = self.model.identifier()))]
    pub async fn render_pdf_async(&self) -> Result<Vec<u8>> {
        self.model
            .encode_qr_codes_concurrently(&self.model.qr_encoder())
            .await?;
        self.compose_pdf()
    }

    pub fn write_html_to_file(&self, template: &HtmlTemplate, path: impl AsRef<Path>) -> Result<()> {
        let html = self.render_html(template)?;
        std::fs::write(path.as_ref(), html)?;
        info!("Wrote HTML sheet to {}", path.as_ref().display());
        Ok(())
    }

    pub fn write_pdf_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.render_pdf()?;
        std::fs::write(path.as_ref(), bytes)?;
        info!("Wrote PDF sheet to {}", path.as_ref().display());
        Ok(())
    }

    fn compose_pdf(&self) -> Result<Vec<u8>> {
        let options = self.model.options();
        let backend = PdfBackend::new(&assemble::title(&options.network), options.paper_size);
        let (backend, sections) = self.compose(backend)?;
        info!(pages = backend.page_count(), ?sections, "PDF sheet composed");
        backend.finish()
    }

    /// Lay the sheet out through any drawing backend.
    fn compose<B: DrawBackend>(&self, backend: B) -> Result<(B, RenderedSections)> {
        let options = self.model.options();
        let header = PageHeader {
            image: options.branding_image.clone(),
            format: dataurl::declared_format(&options.branding_image).unwrap_or(ImageFormat::Png),
            width: BRANDING_WIDTH,
            height: BRANDING_HEIGHT,
        };
        let flow = Flow::new(backend, PageGeometry::for_paper(options.paper_size), Some(header))?;
        let mut writer = FlowWriter::new(flow, self.model.qr_encoder());
        let sections = assemble::assemble(&self.model, &mut writer)?;
        Ok((writer.into_flow().into_backend(), sections))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::testing::RecordingBackend;
    use walletsheet_core::SheetError;
    use walletsheet_core::config::{DEFAULT_BRANDING_IMAGE, RenderOptions, RenderOverrides};
    use walletsheet_core::types::{BackupInfo, ExtraInfoEntry, ImageRef, PaperSize, SecretField};

    const PRIMARY: &str = "abandon ability able about above absent absorb abstract absurd abuse access accident";
    const RECOVERY: &str = "recovery secret words that unlock the backup key";
    const PASSWORD: &str = "password encrypted secret material";

    fn backup(keys: u32) -> BackupInfo {
        let mut backup = BackupInfo {
            wallet_version: Some("v3".into()),
            ..BackupInfo::new()
        }
        .with_secret(SecretField::PrimaryMnemonic, PRIMARY)
        .with_secret(SecretField::RecoveryEncryptedSecret, RECOVERY)
        .with_secret(SecretField::EncryptedSecret, PASSWORD);
        for i in 0..keys {
            backup = backup.with_public_key(i, format!("tpubD6NzVbkrYhZ4X{i}"));
        }
        backup
    }

    fn sheet(backup: BackupInfo, overrides: RenderOverrides) -> RecoverySheet {
        let extra = vec![(
            "Support PIN".to_string(),
            ExtraInfoEntry::Structured {
                title: "Support PIN".into(),
                subtitle: Some("for phone support".into()),
                value: "4821".into(),
            },
        )];
        RecoverySheet::new(RenderModel::build(
            "wallet-1",
            backup,
            extra,
            RenderOptions::merged(overrides),
        ))
    }

    fn html(sheet: &RecoverySheet) -> String {
        sheet.render_html(&HtmlTemplate::builtin()).unwrap()
    }

    #[test]
    fn present_secrets_print_verbatim_and_absent_labels_do_not() {
        let out = html(&sheet(backup(2), RenderOverrides::default()));
        for value in [PRIMARY, RECOVERY, PASSWORD, "wallet-1", "4821"] {
            assert!(out.contains(value), "missing {value}");
        }
        for absent in [
            SecretField::BackupMnemonic,
            SecretField::EncryptedPrimarySeed,
            SecretField::BackupSeed,
        ] {
            assert!(!out.contains(absent.label()), "unexpected {}", absent.label());
        }
        assert!(out.contains("Wallet Identifier (v3)"));
    }

    #[test]
    fn one_caption_per_public_key() {
        for n in [0u32, 1, 3, 4, 7] {
            let out = html(&sheet(backup(n), RenderOverrides::default()));
            assert_eq!(out.matches("KeyIndex: ").count(), n as usize);
            for i in 0..n {
                assert!(out.contains(&format!("KeyIndex: {i} Path: M/{i}'")));
            }
            assert!(out.contains(&format!("{n} in total")));
        }
    }

    #[test]
    fn page_two_is_suppressed_separately_and_combined() {
        let disabled = RenderOverrides {
            page2: Some(false),
            ..Default::default()
        };
        let mut no_secret = backup(1);
        no_secret.set_secret(SecretField::EncryptedSecret, "");

        for (backup, overrides) in [
            (backup(1), disabled.clone()),
            (no_secret.clone(), RenderOverrides::default()),
            (no_secret, disabled),
        ] {
            let out = html(&sheet(backup, overrides));
            assert!(!out.contains("Backup Info - part 2"));
            assert!(!out.contains(SecretField::EncryptedSecret.label()));
            assert!(out.contains("Wallet Recovery Instructions"));
        }
    }

    #[test]
    fn branding_override_replaces_every_default_reference() {
        let custom = "data:image/png;base64,Q1VTVE9N";
        let out = html(&sheet(
            backup(1),
            RenderOverrides {
                branding_image: Some(ImageRef::from_data_url(custom)),
                ..Default::default()
            },
        ));
        assert!(!out.contains(DEFAULT_BRANDING_IMAGE));
        // One header per page: page 1, public keys, part 2 with instructions.
        assert_eq!(out.matches(custom).count(), 3);
    }

    #[test]
    fn empty_sheet_still_renders_pages_one_and_three() {
        let sheet = RecoverySheet::new(RenderModel::build(
            "empty",
            BackupInfo::new(),
            Vec::new(),
            RenderOptions::default(),
        ));
        let out = html(&sheet);
        assert!(out.contains("Bitcoin Wallet Recovery Data Sheet"));
        assert!(out.contains("0 in total"));
        assert!(out.contains("Wallet Recovery Instructions"));
        assert!(!out.contains("<figure>"));
        assert!(!out.contains("part 2"));
    }

    #[test]
    fn html_render_is_deterministic() {
        let sheet = sheet(backup(4), RenderOverrides::default());
        assert_eq!(html(&sheet), html(&sheet));
    }

    #[test]
    fn missing_template_fails_before_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = sheet(backup(3), RenderOverrides::default());
        let err = sheet
            .render_html_from_path(dir.path().join("missing.html"))
            .unwrap_err();
        assert!(matches!(err, SheetError::TemplateLoad(_)));
        assert!(
            sheet
                .model()
                .public_keys()
                .iter()
                .all(|k| k.cached_qr_image().is_none())
        );
    }

    #[test]
    fn composed_layout_places_three_tiles_per_row() {
        let sheet = sheet(backup(5), RenderOverrides::default());
        let (backend, sections) = sheet.compose(RecordingBackend::default()).unwrap();
        assert!(sections.page1 && sections.page2 && sections.page3);

        // Branding on three pages plus five tiles on the key page.
        let images = backend.images();
        let tiles: Vec<_> = images
            .iter()
            .filter(|(_, frame)| frame.width == crate::grid::TILE_SIZE)
            .collect();
        assert_eq!(tiles.len(), 5);
        assert!(tiles.iter().all(|(page, _)| *page == 1));
        assert_eq!(tiles[0].1.y, tiles[2].1.y);
        assert!(tiles[3].1.y > tiles[0].1.y);
        assert_eq!(backend.pages(), 3);
        assert!(backend.texts().contains(&PASSWORD));
    }

    #[test]
    fn composed_layout_fits_tiles_on_a5() {
        let sheet = sheet(
            backup(5),
            RenderOverrides {
                paper_size: Some(PaperSize::A5),
                ..Default::default()
            },
        );
        let (backend, _) = sheet.compose(RecordingBackend::default()).unwrap();
        let geometry = PageGeometry::for_paper(PaperSize::A5);
        let right_edge = geometry.width - geometry.margin_right;

        let tiles: Vec<_> = backend
            .images()
            .into_iter()
            .filter(|(_, frame)| frame.width == frame.height)
            .collect();
        assert_eq!(tiles.len(), 5);
        for (_, frame) in &tiles {
            assert!(frame.x + frame.width <= right_edge + 0.01, "{frame:?}");
        }
        assert_eq!(tiles[0].1.y, tiles[2].1.y);
        assert_eq!(tiles[3].1.y, tiles[4].1.y);
    }

    #[test]
    fn non_latin_mnemonic_fails_pdf_but_renders_in_html() {
        const JAPANESE: &str = "あいこくしん あいさつ あいだ";
        let backup = backup(1).with_secret(SecretField::PrimaryMnemonic, JAPANESE);
        let sheet = sheet(backup, RenderOverrides::default());

        let err = sheet.render_pdf().unwrap_err();
        assert!(matches!(err, SheetError::RenderBackend(_)));
        assert!(!err.to_string().contains(JAPANESE));

        assert!(html(&sheet).contains(JAPANESE));
    }

    #[test]
    fn pdf_has_one_page_per_section_break() {
        let bytes = sheet(backup(2), RenderOverrides::default())
            .render_pdf()
            .unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);

        let bytes = sheet(
            backup(2),
            RenderOverrides {
                page2: Some(false),
                ..Default::default()
            },
        )
        .render_pdf()
        .unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[tokio::test]
    async fn async_pdf_render_encodes_every_key() {
        let sheet = sheet(backup(6), RenderOverrides::default());
        let bytes = sheet.render_pdf_async().await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(
            sheet
                .model()
                .public_keys()
                .iter()
                .all(|k| k.cached_qr_image().is_some())
        );
    }

    #[test]
    fn broken_branding_aborts_the_pdf() {
        let sheet = sheet(
            backup(1),
            RenderOverrides {
                branding_image: Some(ImageRef::from_data_url("data:image/png;base64,AAAA")),
                ..Default::default()
            },
        );
        let err = sheet.render_pdf().unwrap_err();
        assert!(matches!(err, SheetError::RenderBackend(_)));
    }

    #[test]
    fn writes_both_outputs_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = sheet(backup(1), RenderOverrides::default());

        let html_path = dir.path().join("sheet.html");
        sheet
            .write_html_to_file(&HtmlTemplate::builtin(), &html_path)
            .unwrap();
        let written = std::fs::read_to_string(&html_path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));

        let pdf_path = dir.path().join("sheet.pdf");
        sheet.write_pdf_to_file(&pdf_path).unwrap();
        assert!(std::fs::read(&pdf_path).unwrap().starts_with(b"%PDF"));
    }
}
