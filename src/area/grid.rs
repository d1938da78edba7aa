use bevy::prelude::*;

/// Width of one search-map cell in screen pixels.
pub const CELL_WIDTH: i32 = 16;
/// Height of one search-map cell in screen pixels.
pub const CELL_HEIGHT: i32 = 12;

/// Read-only terrain class lookup consumed by the pathfinder.
///
/// Implementors must answer any `(x, y)` with `x < width()` and `y < height()`;
/// callers never ask outside those bounds.
pub trait PassabilitySource {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Terrain class (0..=15) of a cell.
    fn class_at(&self, x: usize, y: usize) -> u8;
}

/// Decoded search map: one 4-bit terrain class per 16x12 pixel cell.
///
/// Filled by the area loader; the pathfinder and scheduler only read it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassabilityGrid {
    width: usize,
    height: usize,
    classes: Vec<u8>,
}

impl PassabilityGrid {
    /// A grid where every cell has the same terrain class.
    pub fn filled(width: usize, height: usize, class: u8) -> Self {
        Self {
            width,
            height,
            classes: vec![class & 0x0f; width * height],
        }
    }

    /// Wrap already-decoded row-major class data.
    ///
    /// Returns `None` when the data length doesn't match the dimensions.
    pub fn from_classes(width: usize, height: usize, classes: Vec<u8>) -> Option<Self> {
        if classes.len() != width * height {
            warn!(
                "Search map data has {} cells, expected {}x{}",
                classes.len(),
                width,
                height
            );
            return None;
        }
        Some(Self {
            width,
            height,
            classes: classes.into_iter().map(|c| c & 0x0f).collect(),
        })
    }

    #[inline]
    pub fn get_index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn set_class(&mut self, x: usize, y: usize, class: u8) {
        let idx = self.get_index(x, y);
        self.classes[idx] = class & 0x0f;
    }

    /// Fill an axis-aligned block of cells, clipped to the grid.
    pub fn fill_rect(&mut self, x: usize, y: usize, width: usize, height: usize, class: u8) {
        let max_x = (x + width).min(self.width);
        let max_y = (y + height).min(self.height);
        for cy in y..max_y {
            for cx in x..max_x {
                self.set_class(cx, cy, class);
            }
        }
    }

    /// Cell containing a pixel position, or `None` when it lies off the map.
    pub fn pixel_to_cell(&self, pixel: IVec2) -> Option<(usize, usize)> {
        if pixel.x < 0 || pixel.y < 0 {
            return None;
        }
        let x = (pixel.x / CELL_WIDTH) as usize;
        let y = (pixel.y / CELL_HEIGHT) as usize;
        if x < self.width && y < self.height {
            Some((x, y))
        } else {
            None
        }
    }

    /// Pixel at the centre of a cell.
    pub fn cell_center(x: usize, y: usize) -> IVec2 {
        IVec2::new(
            x as i32 * CELL_WIDTH + CELL_WIDTH / 2,
            y as i32 * CELL_HEIGHT + CELL_HEIGHT / 2,
        )
    }
}

impl PassabilitySource for PassabilityGrid {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn class_at(&self, x: usize, y: usize) -> u8 {
        self.classes[self.get_index(x, y)]
    }
}
