//! Pixel bitmaps and the geometry derived from them.
//!
//! A [`Bitmap`] is a grid of ink cells with row 0 at the top. Everything that
//! leaves this module is in font units with y increasing upwards and the
//! baseline at zero; [`Bitmap::rectangles`] is the only place where the flip
//! between the two coordinate systems happens.
use kurbo::Rect;
use serde::Deserialize;

/// A rectangular grid of ink cells
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<RawRow>")]
pub struct Bitmap(Vec<Vec<bool>>);

/// A single bitmap row as written in glyph data: either a string of
/// characters or a list of numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawRow {
    Text(String),
    Cells(Vec<i64>),
}

impl From<Vec<RawRow>> for Bitmap {
    fn from(rows: Vec<RawRow>) -> Self {
        Bitmap(
            rows.into_iter()
                .map(|row| match row {
                    RawRow::Text(text) => parse_row(&text),
                    RawRow::Cells(cells) => cells.into_iter().map(|c| c != 0).collect(),
                })
                .collect(),
        )
    }
}

/// `#` and `1` are ink; anything else is blank.
fn parse_row(row: &str) -> Vec<bool> {
    row.chars().map(|c| c == '#' || c == '1').collect()
}

/// Which side of the base glyph an accent attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccentPosition {
    Top,
    Bottom,
}

impl AccentPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccentPosition::Top => "top",
            AccentPosition::Bottom => "bottom",
        }
    }
}

/// The result of overlaying an accent onto a base bitmap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composed {
    pub bitmap: Bitmap,
    /// Row offset of the bottom row of the merged bitmap
    pub y_offset: i32,
}

impl Bitmap {
    pub fn new(rows: Vec<Vec<bool>>) -> Self {
        Bitmap(rows)
    }

    /// Parse character rows, where `#` or `1` marks an ink cell
    pub fn from_text_rows<S: AsRef<str>>(rows: &[S]) -> Self {
        Bitmap(rows.iter().map(|r| parse_row(r.as_ref())).collect())
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.0
    }

    pub fn height(&self) -> usize {
        self.0.len()
    }

    /// The width of the longest row
    pub fn width(&self) -> usize {
        self.0.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn row_widths(&self) -> Vec<usize> {
        self.0.iter().map(Vec::len).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// One `pixel_size` square per ink cell, in font units.
    ///
    /// The cell at `(row, col)` lands at
    /// `x = col * pixel_size`, `y = (y_offset + height - 1 - row) * pixel_size`.
    pub fn rectangles(&self, pixel_size: i32, y_offset: i32) -> Vec<Rect> {
        let height = self.height() as i32;
        let size = f64::from(pixel_size);
        let mut rects = vec![];
        for (row_idx, row) in self.0.iter().enumerate() {
            let y = f64::from((y_offset + height - 1 - row_idx as i32) * pixel_size);
            for (col_idx, ink) in row.iter().enumerate() {
                if *ink {
                    let x = col_idx as f64 * size;
                    rects.push(Rect::new(x, y, x + size, y + size));
                }
            }
        }
        rects
    }

    /// Rasterize rectangles produced by [`Bitmap::rectangles`] back onto a
    /// blank grid of the given dimensions. Rectangles falling outside the
    /// grid are ignored.
    pub fn from_rectangles(
        rects: &[Rect],
        width: usize,
        height: usize,
        pixel_size: i32,
        y_offset: i32,
    ) -> Self {
        let mut rows = vec![vec![false; width]; height];
        let size = f64::from(pixel_size);
        for rect in rects {
            let col = (rect.x0 / size).round() as i64;
            let pixel_y = (rect.y0 / size).round() as i64;
            let row = i64::from(y_offset) + height as i64 - 1 - pixel_y;
            if (0..width as i64).contains(&col) && (0..height as i64).contains(&row) {
                rows[row as usize][col as usize] = true;
            }
        }
        Bitmap(rows)
    }

    /// Overlay `accent` onto this bitmap.
    ///
    /// A top accent's bottom row sits at `anchor_y`; a bottom accent's top
    /// edge sits at `anchor_y`. Both bitmaps are centred on a canvas as wide
    /// as the wider of the two, and `x_adjust` shifts the accent only.
    ///
    /// Returns `None` if `x_adjust` pushes accent ink off the canvas.
    pub fn compose(
        &self,
        base_y_offset: i32,
        accent: &Bitmap,
        anchor_y: i32,
        position: AccentPosition,
        x_adjust: i32,
    ) -> Option<Composed> {
        let base_h = self.height() as i32;
        let accent_h = accent.height() as i32;
        let base_w = self.width();
        let accent_w = accent.width();
        let canvas_w = base_w.max(accent_w);

        let base_bottom = base_y_offset;
        let base_top = base_y_offset + base_h;
        let (accent_bottom, accent_top) = match position {
            AccentPosition::Top => (anchor_y, anchor_y + accent_h),
            AccentPosition::Bottom => (anchor_y - accent_h, anchor_y),
        };

        let combined_bottom = base_bottom.min(accent_bottom);
        let combined_top = base_top.max(accent_top);
        let combined_h = (combined_top - combined_bottom).max(0) as usize;
        let mut canvas = vec![vec![false; canvas_w]; combined_h];

        let mut blit = |bitmap: &Bitmap, bm_w: usize, bm_bottom: i32, x_adjust: i32| -> bool {
            let x_off = (canvas_w as i32 - bm_w as i32).div_euclid(2) + x_adjust;
            let bm_h = bitmap.height() as i32;
            for (row_idx, row) in bitmap.0.iter().enumerate() {
                let pixel_y = bm_bottom + bm_h - 1 - row_idx as i32;
                let canvas_row = (combined_top - 1 - pixel_y) as usize;
                for (col_idx, ink) in row.iter().enumerate() {
                    if !*ink {
                        continue;
                    }
                    let col = x_off + col_idx as i32;
                    if col < 0 || col as usize >= canvas_w {
                        return false;
                    }
                    canvas[canvas_row][col as usize] = true;
                }
            }
            true
        };

        blit(self, base_w, base_bottom, 0);
        if !blit(accent, accent_w, accent_bottom, x_adjust) {
            return None;
        }

        Some(Composed {
            bitmap: Bitmap(canvas),
            y_offset: combined_bottom,
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn grid(rows: &[&str]) -> Bitmap {
        Bitmap::from_text_rows(rows)
    }

    #[rstest]
    #[case("#.#", vec![true, false, true])]
    #[case("1 0", vec![true, false, false])]
    #[case("", vec![])]
    fn test_parse_row(#[case] row: &str, #[case] expected: Vec<bool>) {
        assert_eq!(parse_row(row), expected);
    }

    #[test]
    fn test_deserialize_text_and_numeric_rows() {
        let text: Bitmap = serde_yaml::from_str("['#..', '.#.']").unwrap();
        let numeric: Bitmap = serde_yaml::from_str("[[1, 0, 0], [0, 2, 0]]").unwrap();
        assert_eq!(text, numeric);
        assert_eq!(text.width(), 3);
        assert_eq!(text.height(), 2);
    }

    #[test]
    fn test_rectangles_flip_rows() {
        let bitmap = grid(&["#.", ".#"]);
        let rects = bitmap.rectangles(50, 0);
        assert_eq!(
            rects,
            vec![
                Rect::new(0.0, 50.0, 50.0, 100.0),
                Rect::new(50.0, 0.0, 100.0, 50.0)
            ]
        );
    }

    #[test]
    fn test_rectangles_descender() {
        let bitmap = grid(&["#", "#", "#"]);
        let rects = bitmap.rectangles(10, -2);
        let ys: Vec<f64> = rects.iter().map(|r| r.y0).collect();
        assert_eq!(ys, vec![0.0, -10.0, -20.0]);
    }

    #[rstest]
    #[case(&["#####", "#...#", "#####", "#...#", "#...#"], 0)]
    #[case(&[".#.", "#.#", "...", "###"], -3)]
    #[case(&["#"], 4)]
    fn test_rectangle_round_trip(#[case] rows: &[&str], #[case] y_offset: i32) {
        let bitmap = grid(rows);
        let rects = bitmap.rectangles(50, y_offset);
        let back = Bitmap::from_rectangles(
            &rects,
            bitmap.width(),
            bitmap.height(),
            50,
            y_offset,
        );
        assert_eq!(back, bitmap);
    }

    #[test]
    fn test_compose_top_accent() {
        let base = grid(&["###", "#.#", "###"]);
        let accent = grid(&["#"]);
        let composed = base
            .compose(0, &accent, 4, AccentPosition::Top, 0)
            .unwrap();
        assert_eq!(composed.y_offset, 0);
        assert_eq!(
            composed.bitmap,
            grid(&[".#.", "...", "###", "#.#", "###"])
        );
    }

    #[test]
    fn test_compose_bottom_accent_extends_down() {
        let base = grid(&["###", "###"]);
        let accent = grid(&["##"]);
        let composed = base
            .compose(0, &accent, 0, AccentPosition::Bottom, 1)
            .unwrap();
        assert_eq!(composed.y_offset, -1);
        assert_eq!(composed.bitmap, grid(&["###", "###", ".##"]));
    }

    #[test]
    fn test_compose_offset_is_minimum_extent() {
        let base = grid(&["#", "#"]);
        let accent = grid(&["#", "#", "#"]);
        let composed = base
            .compose(-3, &accent, 5, AccentPosition::Top, 0)
            .unwrap();
        assert_eq!(composed.y_offset, -3);
        assert_eq!(composed.bitmap.height(), 11);
    }

    #[test]
    fn test_compose_disjoint_footprints_commute() {
        // Drawing order does not matter when the inks do not overlap.
        let base = grid(&["#.#", "#.#"]);
        let accent = grid(&["#"]);
        let composed = base
            .compose(0, &accent, 2, AccentPosition::Top, 0)
            .unwrap();
        let mut expected = vec![vec![false; 3]; 3];
        expected[0][1] = true;
        for row in 1..3 {
            expected[row][0] = true;
            expected[row][2] = true;
        }
        assert_eq!(composed.bitmap, Bitmap::new(expected));
    }

    #[test]
    fn test_compose_out_of_bounds() {
        let base = grid(&["###"]);
        let accent = grid(&["#"]);
        assert!(base
            .compose(0, &accent, 1, AccentPosition::Top, 2)
            .is_none());
        assert!(base
            .compose(0, &accent, 1, AccentPosition::Top, 1)
            .is_some());
    }
}
