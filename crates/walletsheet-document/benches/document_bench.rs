// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the walletsheet-document crate: tile planning and a
// full HTML sheet render.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use walletsheet_core::RenderOptions;
use walletsheet_core::types::{BackupInfo, SecretField};
use walletsheet_document::{GridPlanner, HtmlTemplate, RecoverySheet, RenderModel};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Plan placements for a large key set.
fn bench_grid_plan(c: &mut Criterion) {
    let planner = GridPlanner::default();
    c.bench_function("grid_plan (300 tiles)", |b| {
        b.iter(|| black_box(planner.plan(black_box(300))));
    });
}

/// Render a sheet with nine public keys to HTML, QR encoding included.
///
/// A fresh model per iteration keeps the QR cache cold.
fn bench_html_render(c: &mut Criterion) {
    let template = HtmlTemplate::builtin();
    let backup = (0..9u32).fold(
        BackupInfo::new()
            .with_secret(SecretField::PrimaryMnemonic, "abandon ability able about above absent")
            .with_secret(SecretField::EncryptedSecret, "password encrypted secret"),
        |backup, i| backup.with_public_key(i, format!("tpubD6NzVbkrYhZ4XgiXtGrdW5XDAPFCL9h7we1vwNCpn8tGbBcgfVYjXyhWo4E1xkh56hjod1RhGjxbaTLV3X4FyWuejifB9jusQ46QzG87VKp{i}")),
    );

    c.bench_function("html_render (9 keys)", |b| {
        b.iter(|| {
            let model = RenderModel::build("bench-wallet", backup.clone(), Vec::new(), RenderOptions::default());
            let html = RecoverySheet::new(model).render_html(&template);
            black_box(html.map(|h| h.len()).unwrap_or_default());
        });
    });
}

criterion_group!(benches, bench_grid_plan, bench_html_render);
criterion_main!(benches);
