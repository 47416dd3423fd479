//! Canonical sheet layout: the geometry contract shared with page generation.
//!
//! Every coordinate produced here is in canonical page points (A4, 595×842)
//! and must match the page generator's constants bit for bit — the generator
//! and the recognizer consume this one module rather than carrying separate
//! copies of row pitch, bubble radius, or column offsets.

use serde::{Deserialize, Serialize};

/// Canonical page width in points (warp target, classifier rescale base).
pub const CANONICAL_WIDTH: u32 = 595;
/// Canonical page height in points.
pub const CANONICAL_HEIGHT: u32 = 842;

/// Choice labels in bubble order. Index `i` in a row is labeled `CHOICE_LABELS[i]`.
pub const CHOICE_LABELS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// Maximum number of items a single two-column page holds.
pub const MAX_ITEMS: usize = ITEMS_PER_COLUMN * 2;
/// Items stacked in one column before wrapping to the next.
pub const ITEMS_PER_COLUMN: usize = 25;

// A4 dimensions the generator lays out against (jsPDF "pt" units).
const PAGE_WIDTH_PT: f32 = 595.28;

// Answer-grid constants, shared with the generator.
const ROW_PITCH: f32 = 22.0;
const BUBBLE_RADIUS: f32 = 7.0;
const BUBBLE_PITCH: f32 = 20.0;
const NUMBER_LABEL_WIDTH: f32 = 18.0;
const LABEL_GAP: f32 = 8.0;
const COLUMN_LEFT_X: f32 = 60.0;
const COLUMN_BAND_WIDTH: f32 = (PAGE_WIDTH_PT - 2.0 * COLUMN_LEFT_X) / 2.0;
// Bubble centers sit this far below the row origin, plus one radius.
const BUBBLE_DROP: f32 = 9.0;

// Header stack, top of page to the first answer row. Mirrors the generator's
// header draw sequence: top margin, title lead, subject lead, two identity
// box rows, directions lead, three directions lines, trailing gap.
const TOP_MARGIN: f32 = 48.0;
const TITLE_LEAD: f32 = 22.0;
const SUBJECT_LEAD: f32 = 18.0;
const IDENTITY_BOX_HEIGHT: f32 = 24.0;
const DIRECTIONS_LEAD: f32 = 36.0;
const DIRECTIONS_FIRST_LINE: f32 = 14.0;
const DIRECTIONS_WRAP_LINES: f32 = 13.0 * 2.0;
const DIRECTIONS_TRAILING: f32 = 14.0;
const FIRST_ROW_Y: f32 = TOP_MARGIN
    + TITLE_LEAD
    + SUBJECT_LEAD
    + 2.0 * IDENTITY_BOX_HEIGHT
    + DIRECTIONS_LEAD
    + DIRECTIONS_FIRST_LINE
    + DIRECTIONS_WRAP_LINES
    + DIRECTIONS_TRAILING;

// Handwritten identity boxes in the header.
const FIELD_BOX_X: f32 = 48.0;
const FIELD_BOX_WIDTH: f32 = 200.0;
const NAME_BOX_Y: f32 = TOP_MARGIN + TITLE_LEAD + SUBJECT_LEAD;
const SECTION_BOX_Y: f32 = NAME_BOX_Y + IDENTITY_BOX_HEIGHT;

/// Sheet parameters fixed at generation time.
///
/// Immutable once copies of the page exist: changing item or choice counts
/// invalidates stored answer keys and prior scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSheetConfig")]
pub struct SheetConfig {
    num_items: usize,
    num_choices: usize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RawSheetConfig {
    num_items: usize,
    num_choices: usize,
}

impl TryFrom<RawSheetConfig> for SheetConfig {
    type Error = LayoutError;

    fn try_from(raw: RawSheetConfig) -> Result<Self, LayoutError> {
        Self::new(raw.num_items, raw.num_choices)
    }
}

impl SheetConfig {
    /// Validate and construct a sheet configuration.
    ///
    /// `num_items` must fit the two-column page (1..=50), `num_choices`
    /// must be in 2..=6 (labels A..F).
    pub fn new(num_items: usize, num_choices: usize) -> Result<Self, LayoutError> {
        if num_items == 0 || num_items > MAX_ITEMS {
            return Err(LayoutError::ItemCountOutOfRange { got: num_items });
        }
        if !(2..=CHOICE_LABELS.len()).contains(&num_choices) {
            return Err(LayoutError::ChoiceCountOutOfRange { got: num_choices });
        }
        Ok(Self {
            num_items,
            num_choices,
        })
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }

    pub fn num_choices(&self) -> usize {
        self.num_choices
    }

    /// Choice labels valid for this sheet (`A..` prefix of length `num_choices`).
    pub fn choice_labels(&self) -> &'static [char] {
        &CHOICE_LABELS[..self.num_choices]
    }
}

/// Invalid sheet parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    ItemCountOutOfRange { got: usize },
    ChoiceCountOutOfRange { got: usize },
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemCountOutOfRange { got } => {
                write!(f, "num_items must be in 1..={}, got {}", MAX_ITEMS, got)
            }
            Self::ChoiceCountOutOfRange { got } => {
                write!(
                    f,
                    "num_choices must be in 2..={}, got {}",
                    CHOICE_LABELS.len(),
                    got
                )
            }
        }
    }
}

impl std::error::Error for LayoutError {}

/// One answer bubble: circle center and radius in canonical points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    pub x: f32,
    pub y: f32,
    pub r: f32,
}

/// Axis-aligned rectangle in canonical points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Region {
    /// Grow the rectangle by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Region {
        Region {
            x: self.x - margin,
            y: self.y - margin,
            w: self.w + 2.0 * margin,
            h: self.h + 2.0 * margin,
        }
    }
}

/// Handwritten identity boxes the field extractor reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldRegions {
    pub name: Region,
    pub section: Region,
}

impl FieldRegions {
    /// Regions paired with their field names, in extraction order.
    pub fn named(&self) -> [(&'static str, Region); 2] {
        [("name", self.name), ("section", self.section)]
    }
}

/// Derived canonical geometry for one sheet configuration.
///
/// Build once per sheet, share read-only across a scan batch.
#[derive(Debug, Clone)]
pub struct SheetLayout {
    config: SheetConfig,
    rows: Vec<Vec<Bubble>>,
}

impl SheetLayout {
    pub fn new(config: SheetConfig) -> Self {
        let rows = generate_rows(config);
        Self { config, rows }
    }

    pub fn config(&self) -> SheetConfig {
        self.config
    }

    /// Bubble circle per item row, `num_items` rows of `num_choices` bubbles.
    pub fn bubble_positions(&self) -> &[Vec<Bubble>] {
        &self.rows
    }

    /// Identity-field boxes. Independent of item/choice counts.
    pub fn text_field_regions(&self) -> FieldRegions {
        FieldRegions {
            name: Region {
                x: FIELD_BOX_X,
                y: NAME_BOX_Y,
                w: FIELD_BOX_WIDTH,
                h: IDENTITY_BOX_HEIGHT,
            },
            section: Region {
                x: FIELD_BOX_X,
                y: SECTION_BOX_Y,
                w: FIELD_BOX_WIDTH,
                h: IDENTITY_BOX_HEIGHT,
            },
        }
    }
}

fn generate_rows(config: SheetConfig) -> Vec<Vec<Bubble>> {
    let group_width =
        NUMBER_LABEL_WIDTH + LABEL_GAP + config.num_choices() as f32 * BUBBLE_PITCH;
    let group_offset = (COLUMN_BAND_WIDTH - group_width) / 2.0;

    let mut rows = Vec::with_capacity(config.num_items());
    for item in 0..config.num_items() {
        let column = item / ITEMS_PER_COLUMN;
        let row_in_column = item % ITEMS_PER_COLUMN;
        let column_x = COLUMN_LEFT_X + column as f32 * COLUMN_BAND_WIDTH;
        let base_x = column_x + group_offset + NUMBER_LABEL_WIDTH + LABEL_GAP;
        let y = FIRST_ROW_Y + row_in_column as f32 * ROW_PITCH + BUBBLE_RADIUS + BUBBLE_DROP;

        let row = (0..config.num_choices())
            .map(|choice| Bubble {
                x: base_x + choice as f32 * BUBBLE_PITCH,
                y,
                r: BUBBLE_RADIUS,
            })
            .collect();
        rows.push(row);
    }
    rows
}
