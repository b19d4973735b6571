// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// QR grid planner: packs square tiles into rows of fixed capacity.
//
// Tiles in one row share a single vertical coordinate. The row top is
// saved when a row starts and every later tile in that row draws from it, so
// the shared coordinate is exact rather than the result of undoing an
// advance.

use tracing::{debug, instrument};
use walletsheet_core::error::{Result, SheetError};
use walletsheet_core::types::{ImageFormat, ImageRef};

use crate::flow::{DrawBackend, Flow, IMAGE_GAP};

/// Tiles per row on the sheet.
pub const ROW_CAPACITY: usize = 3;
/// Edge length of a QR tile, in points.
pub const TILE_SIZE: f32 = 150.0;
/// Room under each tile row for its captions.
pub const CAPTION_HEIGHT: f32 = 17.0;
/// Caption indent from the tile's left edge, at full tile size.
pub const CAPTION_INDENT: f32 = 20.0;

/// Where one tile goes, relative to the top-left of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePlacement {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub x_offset: f32,
    pub y_offset: f32,
}

impl TilePlacement {
    /// First tile of any row but the first.
    pub fn starts_new_row(&self) -> bool {
        self.col == 0 && self.index > 0
    }
}

/// One image plus its caption, ready to place.
#[derive(Debug, Clone, Copy)]
pub struct Tile<'a> {
    pub image: &'a ImageRef,
    pub caption: &'a str,
}

/// Row-major placement of equally sized tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPlanner {
    tile_size: f32,
    row_capacity: usize,
    row_gap: f32,
}

impl Default for GridPlanner {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            row_capacity: ROW_CAPACITY,
            row_gap: IMAGE_GAP + CAPTION_HEIGHT,
        }
    }
}

impl GridPlanner {
    /// A planner for `row_capacity` tiles of `tile_size` per row, with
    /// `row_gap` between rows.
    pub fn new(tile_size: f32, row_capacity: usize, row_gap: f32) -> Result<Self> {
        if row_capacity == 0 {
            return Err(SheetError::InvalidInput(
                "grid row capacity must be at least 1".into(),
            ));
        }
        if row_gap < IMAGE_GAP {
            return Err(SheetError::InvalidInput(format!(
                "grid row gap must be at least the image gap ({IMAGE_GAP})"
            )));
        }
        Ok(Self {
            tile_size,
            row_capacity,
            row_gap,
        })
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn row_capacity(&self) -> usize {
        self.row_capacity
    }

    /// Distance between the tops of consecutive rows.
    pub fn row_pitch(&self) -> f32 {
        self.tile_size + self.row_gap
    }

    pub fn rows(&self, count: usize) -> usize {
        count.div_ceil(self.row_capacity)
    }

    /// Shrink tiles so a full row fits in `width` points. Never grows them.
    pub fn fit_width(self, width: f32) -> Self {
        let fitting = width / self.row_capacity as f32;
        Self {
            tile_size: self.tile_size.min(fitting),
            ..self
        }
    }

    /// Caption indent, scaled with the tile.
    pub fn caption_indent(&self) -> f32 {
        CAPTION_INDENT * (self.tile_size / TILE_SIZE).min(1.0)
    }

    /// Total height the grid occupies for `count` tiles.
    pub fn grid_height(&self, count: usize) -> f32 {
        self.rows(count) as f32 * self.row_pitch()
    }

    /// Placement of tiles `0..count`.
    pub fn plan(&self, count: usize) -> Vec<TilePlacement> {
        (0..count)
            .map(|index| {
                let col = index % self.row_capacity;
                let row = index / self.row_capacity;
                TilePlacement {
                    index,
                    row,
                    col,
                    x_offset: col as f32 * self.tile_size,
                    y_offset: row as f32 * self.row_pitch(),
                }
            })
            .collect()
    }

    /// Draw `tiles` at the flow cursor, captions under each tile, leaving
    /// the cursor just below the last row's captions.
    ///
    /// A row that would cross the bottom margin starts on a new page.
    /// Captions wrap to the tile width.
    #[instrument(skip_all, fields(tiles = tiles.len(), tile_size = self.tile_size))]
    pub fn draw<B: DrawBackend>(
        &self,
        flow: &mut Flow<B>,
        tiles: &[Tile<'_>],
        caption_size: f32,
    ) -> Result<()> {
        if tiles.is_empty() {
            return Ok(());
        }

        let indent = self.caption_indent();
        let mut row_top = flow.cursor().y();
        for (placement, tile) in self.plan(tiles.len()).into_iter().zip(tiles) {
            if placement.col == 0 {
                if placement.starts_new_row() {
                    flow.set_y(row_top + self.row_pitch());
                }
                flow.ensure_room(self.row_pitch())?;
                row_top = flow.cursor().y();
            } else {
                flow.set_y(row_top);
            }

            flow.draw_image(
                tile.image,
                ImageFormat::Png,
                self.tile_size,
                self.tile_size,
                placement.x_offset,
            )?;
            flow.font_size(caption_size).draw_text_in(
                tile.caption,
                placement.x_offset + indent,
                self.tile_size - indent,
                false,
            )?;
        }
        flow.set_y(row_top + self.row_pitch());

        debug!(rows = self.rows(tiles.len()), "Tile grid drawn");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::testing::{RecordingBackend, flow_without_header};
    use crate::flow::{PageGeometry, Rect};
    use walletsheet_core::types::PaperSize;

    fn tiles<'a>(image: &'a ImageRef, captions: &'a [String]) -> Vec<Tile<'a>> {
        captions
            .iter()
            .map(|caption| Tile {
                image,
                caption: caption.as_str(),
            })
            .collect()
    }

    fn captions(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("KeyIndex: {i} Path: M/{i}'")).collect()
    }

    fn image() -> ImageRef {
        ImageRef::from_data_url("data:image/png;base64,AAAA")
    }

    #[test]
    fn columns_wrap_at_capacity() {
        let plan = GridPlanner::default().plan(7);
        let cols: Vec<usize> = plan.iter().map(|p| p.col).collect();
        let rows: Vec<usize> = plan.iter().map(|p| p.row).collect();
        assert_eq!(cols, vec![0, 1, 2, 0, 1, 2, 0]);
        assert_eq!(rows, vec![0, 0, 0, 1, 1, 1, 2]);
        assert_eq!(plan[2].x_offset, 2.0 * TILE_SIZE);
        assert!(plan[3].starts_new_row());
        assert!(!plan[0].starts_new_row());
    }

    #[test]
    fn zero_tiles_plan_nothing() {
        let planner = GridPlanner::default();
        assert!(planner.plan(0).is_empty());
        assert_eq!(planner.grid_height(0), 0.0);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = GridPlanner::new(100.0, 0, 10.0).unwrap_err();
        assert!(matches!(err, SheetError::InvalidInput(_)));
    }

    #[test]
    fn single_column_grid_stacks_tiles() {
        let planner = GridPlanner::new(50.0, 1, 10.0).unwrap();
        let plan = planner.plan(3);
        assert!(plan.iter().all(|p| p.col == 0 && p.x_offset == 0.0));
        assert_eq!(plan[2].y_offset, 2.0 * 60.0);
    }

    #[test]
    fn tiles_in_a_row_share_one_vertical_position() {
        let mut flow = flow_without_header();
        let top = flow.cursor().y();
        let planner = GridPlanner::default();
        let captions = captions(5);
        let image = image();
        planner
            .draw(&mut flow, &tiles(&image, &captions), 8.0)
            .unwrap();

        let frames: Vec<Rect> = flow.backend().images().into_iter().map(|(_, f)| f).collect();
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0].y, top);
        assert_eq!(frames[1].y, top);
        assert_eq!(frames[2].y, top);
        assert_eq!(frames[3].y, top + planner.row_pitch());
        assert_eq!(frames[4].y, top + planner.row_pitch());

        let margin = flow.geometry().margin_left;
        let xs: Vec<f32> = frames.iter().map(|f| f.x - margin).collect();
        assert_eq!(xs, vec![0.0, TILE_SIZE, 2.0 * TILE_SIZE, 0.0, TILE_SIZE]);

        // Net advance is exactly the grid height.
        assert_eq!(flow.cursor().y(), top + planner.grid_height(5));
    }

    #[test]
    fn grid_matches_plan_offsets() {
        let mut flow = flow_without_header();
        let top = flow.cursor().y();
        let planner = GridPlanner::new(40.0, 4, 12.0).unwrap();
        let captions = captions(10);
        let image = image();
        planner
            .draw(&mut flow, &tiles(&image, &captions), 6.0)
            .unwrap();

        let frames = flow.backend().images();
        for (placement, (_, frame)) in planner.plan(10).iter().zip(frames) {
            assert_eq!(frame.y - top, placement.y_offset, "tile {}", placement.index);
        }
    }

    #[test]
    fn captions_sit_under_their_tile_without_moving_the_cursor() {
        let mut flow = flow_without_header();
        let top = flow.cursor().y();
        let captions = captions(2);
        let image = image();
        GridPlanner::default()
            .draw(&mut flow, &tiles(&image, &captions), 8.0)
            .unwrap();

        assert_eq!(flow.backend().texts(), vec!["KeyIndex: 0 Path: M/0'", "KeyIndex: 1 Path: M/1'"]);
        let caption_ys: Vec<f32> = flow
            .backend()
            .calls
            .iter()
            .filter_map(|c| match c {
                crate::flow::testing::Call::Text { y, .. } => Some(*y),
                _ => None,
            })
            .collect();
        assert_eq!(caption_ys, vec![top + TILE_SIZE + IMAGE_GAP; 2]);
    }

    #[test]
    fn row_mates_share_an_offset_that_is_not_exact_in_f32() {
        let mut flow = flow_without_header();
        // Header, subheading and count lines leave the cursor at 111.6.
        flow.advance(33.0);
        flow.advance(15.6);
        flow.advance(13.0);
        flow.advance(20.0);
        let top = flow.cursor().y();
        let captions = captions(6);
        let image = image();
        GridPlanner::default()
            .draw(&mut flow, &tiles(&image, &captions), 8.0)
            .unwrap();

        let ys: Vec<f32> = flow.backend().images().iter().map(|(_, f)| f.y).collect();
        assert_eq!(ys[0], top);
        assert_eq!(ys[1], ys[0]);
        assert_eq!(ys[2], ys[0]);
        assert_eq!(ys[4], ys[3]);
        assert_eq!(ys[5], ys[3]);
        assert!(ys[3] > ys[0]);
    }

    #[test]
    fn fitted_grid_stays_inside_a5_content() {
        let geometry = PageGeometry::for_paper(PaperSize::A5);
        let mut flow = Flow::new(RecordingBackend::default(), geometry, None).unwrap();
        let planner = GridPlanner::default().fit_width(geometry.content_width());
        assert!(planner.tile_size() < TILE_SIZE);

        let captions = captions(3);
        let image = image();
        planner
            .draw(&mut flow, &tiles(&image, &captions), 8.0)
            .unwrap();

        let right_edge = geometry.width - geometry.margin_right;
        for (_, frame) in flow.backend().images() {
            assert!(frame.x + frame.width <= right_edge + 0.01, "{frame:?}");
        }
        // Captions fit their tile without being split.
        assert_eq!(flow.backend().texts(), captions.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn fitting_never_grows_tiles() {
        let planner = GridPlanner::default().fit_width(2000.0);
        assert_eq!(planner.tile_size(), TILE_SIZE);
        assert_eq!(planner.caption_indent(), CAPTION_INDENT);
    }

    #[test]
    fn empty_grid_leaves_cursor_alone() {
        let mut flow = flow_without_header();
        let top = flow.cursor().y();
        GridPlanner::default().draw(&mut flow, &[], 8.0).unwrap();
        assert_eq!(flow.cursor().y(), top);
        assert!(flow.backend().images().is_empty());
    }

    #[test]
    fn rows_that_do_not_fit_move_to_the_next_page() {
        let geometry = PageGeometry::for_paper(PaperSize::Letter);
        let mut flow = Flow::new(RecordingBackend::default(), geometry, None).unwrap();
        let planner = GridPlanner::default();
        let captions = captions(15);
        let image = image();
        planner
            .draw(&mut flow, &tiles(&image, &captions), 8.0)
            .unwrap();

        let images = flow.backend().images();
        let rows_per_page =
            ((geometry.content_bottom() - geometry.margin_top) / planner.row_pitch()) as usize;
        let first_on_page_two = rows_per_page * ROW_CAPACITY;
        assert_eq!(images[first_on_page_two - 1].0, 0);
        assert_eq!(images[first_on_page_two].0, 1);
        assert_eq!(images[first_on_page_two].1.y, geometry.margin_top);
        // Row mates follow their row leader onto the new page.
        assert_eq!(images[first_on_page_two + 1].0, 1);
        assert_eq!(images[first_on_page_two + 1].1.y, geometry.margin_top);
    }
}
