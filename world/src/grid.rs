//! Tile storage, character classification and the solidity predicate.

use std::{ops::Range, sync::OnceLock};

use stagehop_core::{
    CellCoord, EnemyKind, ItemKind, Layer, PipeKind, Terrain, TileClass, TILE_SIZE,
};

/// Fixed lookup table translating every byte into its four tile classifications.
#[derive(Debug)]
pub struct ClassificationTable {
    entries: [TileClass; 256],
}

impl ClassificationTable {
    /// Returns the process-wide table, building it on first use.
    #[must_use]
    pub fn shared() -> &'static Self {
        static TABLE: OnceLock<ClassificationTable> = OnceLock::new();
        TABLE.get_or_init(Self::build)
    }

    fn build() -> Self {
        let mut entries = [TileClass::default(); 256];
        for (byte, entry) in (0..=u8::MAX).zip(entries.iter_mut()) {
            *entry = classify(byte);
        }
        Self { entries }
    }

    /// Classifies a stage character. Characters outside the byte range are empty.
    #[must_use]
    pub fn classify(&self, symbol: char) -> TileClass {
        u8::try_from(symbol)
            .map(|byte| self.entries[usize::from(byte)])
            .unwrap_or_default()
    }
}

fn classify(symbol: u8) -> TileClass {
    let empty = TileClass::default();
    let terrain = |terrain| TileClass { terrain, ..empty };
    let boxed = |kind| TileClass {
        terrain: Terrain::ItemBox,
        boxed: Some(kind),
        ..empty
    };
    let spawn = |kind| TileClass {
        terrain: Terrain::EnemySpawn,
        enemy: Some(kind),
        ..empty
    };
    let pipe = |pipe| TileClass {
        terrain: Terrain::Pipe,
        pipe,
        ..empty
    };

    match symbol {
        b'1' => terrain(Terrain::Ground),
        b'2' => terrain(Terrain::Block),
        b'3' => terrain(Terrain::ItemBox),
        b'4' => terrain(Terrain::Coin),
        b'G' => terrain(Terrain::Goal),
        b'S' => terrain(Terrain::Start),
        b'c' => boxed(ItemKind::Coin),
        b'm' => boxed(ItemKind::Mushroom),
        b's' => boxed(ItemKind::Star),
        b'f' => boxed(ItemKind::FireFlower),
        b'M' => spawn(EnemyKind::Walker),
        b'T' => spawn(EnemyKind::Turtle),
        b'P' => pipe(PipeKind::Normal),
        b'W' | b'!' | b'#' | b'I' | b'O' => pipe(PipeKind::Warp),
        b'F' => pipe(PipeKind::Flower),
        _ => empty,
    }
}

/// Outcome of striking a cell from below.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Strike {
    /// A breakable block turned into open air.
    Broke,
    /// An item box turned into a plain block, releasing its content if any.
    Opened(Option<ItemKind>),
}

/// Dense grid of classified cells partitioned into overworld and underground rows.
#[derive(Clone, Debug, Default)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    cells: Vec<TileClass>,
    underground_row: u32,
    active: Layer,
}

impl TileGrid {
    /// Builds a grid from stage rows, padding short rows with empty cells.
    ///
    /// `underground_row` is clamped to the number of rows.
    #[must_use]
    pub fn from_rows<'a, I>(lines: I, underground_row: u32) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let table = ClassificationTable::shared();
        let classified: Vec<Vec<TileClass>> = lines
            .into_iter()
            .map(|line| line.chars().map(|symbol| table.classify(symbol)).collect())
            .collect();
        let columns = classified.iter().map(Vec::len).max().unwrap_or(0);
        let rows = classified.len();

        let mut cells = Vec::with_capacity(columns * rows);
        for row in classified {
            let padding = columns - row.len();
            cells.extend(row);
            cells.extend(std::iter::repeat(TileClass::default()).take(padding));
        }

        let rows = u32::try_from(rows).unwrap_or(u32::MAX);
        Self {
            columns: u32::try_from(columns).unwrap_or(u32::MAX),
            rows,
            cells,
            underground_row: underground_row.min(rows),
            active: Layer::Overworld,
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// First row that belongs to the underground layer.
    #[must_use]
    pub const fn underground_row(&self) -> u32 {
        self.underground_row
    }

    /// Layer currently simulated and rendered.
    #[must_use]
    pub const fn active_layer(&self) -> Layer {
        self.active
    }

    pub(crate) fn set_active_layer(&mut self, layer: Layer) {
        self.active = layer;
    }

    /// Total width of the stage in world pixels.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * TILE_SIZE
    }

    /// Rows that make up the provided layer.
    #[must_use]
    pub fn row_range(&self, layer: Layer) -> Range<u32> {
        match layer {
            Layer::Overworld => 0..self.underground_row,
            Layer::Underground => self.underground_row..self.rows,
        }
    }

    /// Layer that owns the provided row.
    #[must_use]
    pub fn layer_of_row(&self, row: u32) -> Layer {
        if row >= self.underground_row {
            Layer::Underground
        } else {
            Layer::Overworld
        }
    }

    /// Classification of a cell; out-of-bounds cells are empty.
    #[must_use]
    pub fn class_at(&self, cell: CellCoord) -> TileClass {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or_default()
    }

    /// Terrain of a cell; out-of-bounds cells are empty.
    #[must_use]
    pub fn terrain_at(&self, cell: CellCoord) -> Terrain {
        self.class_at(cell).terrain
    }

    /// Cell containing the world pixel, if the pixel lies inside the grid.
    #[must_use]
    pub fn cell_at(&self, x: f32, y: f32) -> Option<CellCoord> {
        let column = (x / TILE_SIZE).floor();
        let row = (y / TILE_SIZE).floor();
        if column < 0.0 || row < 0.0 || !column.is_finite() || !row.is_finite() {
            return None;
        }
        let (column, row) = (column as u32, row as u32);
        (column < self.columns && row < self.rows).then(|| CellCoord::new(column, row))
    }

    /// Reports whether the pixel is inside the active layer and on solid terrain.
    #[must_use]
    pub fn is_solid_at(&self, x: f32, y: f32) -> bool {
        self.cell_at(x, y).is_some_and(|cell| {
            self.row_range(self.active).contains(&cell.row())
                && self.terrain_at(cell).is_solid()
        })
    }

    /// Pipe classification of the cell holding the pixel.
    #[must_use]
    pub fn pipe_kind_at(&self, x: f32, y: f32) -> PipeKind {
        self.cell_at(x, y)
            .map_or(PipeKind::Normal, |cell| self.class_at(cell).pipe)
    }

    /// Applies an upward impact to a cell in the active layer.
    pub(crate) fn strike(&mut self, cell: CellCoord) -> Option<Strike> {
        if !self.row_range(self.active).contains(&cell.row()) {
            return None;
        }
        let index = self.index(cell)?;
        let class = self.cells.get_mut(index)?;
        match class.terrain {
            Terrain::Block => {
                *class = TileClass::default();
                Some(Strike::Broke)
            }
            Terrain::ItemBox => {
                let released = class.boxed.take();
                class.terrain = Terrain::Block;
                Some(Strike::Opened(released))
            }
            _ => None,
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}
