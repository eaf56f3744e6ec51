//! Board geometry: the central field, the six homes and the axis lines.

use std::collections::HashMap;

use crate::transform::CoordinateTransformer;
use crate::{Color, Coord};

/// Which part of the star a spot belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Region {
    Field,
    Home(Color),
}

/// Progress sign pattern per color, indexed by [`Color::index`].
///
/// On the lattice plane these reduce to `±2x`, `±2y` or `±2z`, growing from
/// the color's own home toward its opposing home.
const PROGRESS_SIGNS: [[i32; 3]; 6] = [
    [-1, 1, -1], // red:    -2x
    [-1, -1, -1], // yellow: -2z
    [1, -1, -1], // green:  -2y
    [1, -1, 1],  // black:  +2x
    [1, 1, 1],   // blue:   +2z
    [-1, 1, 1],  // grey:   +2y
];

/// The star-shaped board of size `n`.
///
/// Spots are stored once in `board_spots` (field first, then the homes in
/// color order) and referred to by their index elsewhere.
#[derive(Clone, Debug)]
pub struct Board {
    n: i32,
    rotator: CoordinateTransformer,
    field_spots: Vec<Coord>,
    home_spots: [Vec<Coord>; 6],
    board_spots: Vec<Coord>,
    index: HashMap<Coord, usize>,
    regions: Vec<Region>,
    /// Per axis: component value -> spot indices sorted by the next axis.
    lines: [HashMap<i32, Vec<usize>>; 3],
}

impl Board {
    /// Build the board of size `n`. Each home holds `n(n+1)/2` spots.
    pub fn new(n: u32) -> Board {
        let n = n as i32;
        let rotator = CoordinateTransformer::rotation();
        let candidates = hexgrid(2 * n);

        let field_spots: Vec<Coord> = candidates.iter().copied().filter(|&c| in_field(n, c)).collect();
        let home_spots: [Vec<Coord>; 6] = Color::ALL.map(|color| {
            candidates
                .iter()
                .copied()
                .filter(|&c| in_first_home(n, rotator.transform_one(c, color.rotation())))
                .collect()
        });

        let mut board_spots = field_spots.clone();
        let mut regions = vec![Region::Field; field_spots.len()];
        for color in Color::ALL {
            board_spots.extend_from_slice(&home_spots[color.index()]);
            regions.resize(board_spots.len(), Region::Home(color));
        }

        let index: HashMap<Coord, usize> = board_spots.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        debug_assert_eq!(index.len(), board_spots.len(), "regions overlap");

        let mut lines: [HashMap<i32, Vec<usize>>; 3] = Default::default();
        for (axis, table) in lines.iter_mut().enumerate() {
            for (i, spot) in board_spots.iter().enumerate() {
                table.entry(spot.axis(axis)).or_default().push(i);
            }
            let next = (axis + 1) % 3;
            for line in table.values_mut() {
                line.sort_by_key(|&i| board_spots[i].axis(next));
            }
        }

        Board {
            n,
            rotator,
            field_spots,
            home_spots,
            board_spots,
            index,
            regions,
            lines,
        }
    }

    #[inline]
    pub fn n(&self) -> u32 {
        self.n as u32
    }

    /// Number of pieces each color starts with.
    #[inline]
    pub fn pieces_per_player(&self) -> usize {
        (self.n * (self.n + 1) / 2) as usize
    }

    /// Every legal spot: the field followed by the six homes.
    #[inline]
    pub fn board_spots(&self) -> &[Coord] {
        &self.board_spots
    }

    #[inline]
    pub fn field_spots(&self) -> &[Coord] {
        &self.field_spots
    }

    /// Home spots of one color.
    #[inline]
    pub fn home_spots(&self, color: Color) -> &[Coord] {
        &self.home_spots[color.index()]
    }

    /// Whether the spot is in the central hexagon.
    #[inline]
    pub fn in_field(&self, c: Coord) -> bool {
        in_field(self.n, c)
    }

    /// Whether the spot is in the home of `color`, tested by rotating it onto
    /// the first home.
    #[inline]
    pub fn in_home(&self, color: Color, c: Coord) -> bool {
        in_first_home(self.n, self.rotator.transform_one(c, color.rotation()))
    }

    #[inline]
    pub fn in_board(&self, c: Coord) -> bool {
        self.index.contains_key(&c)
    }

    #[inline]
    pub fn spot_index(&self, c: Coord) -> Option<usize> {
        self.index.get(&c).copied()
    }

    #[inline]
    pub fn spot(&self, idx: usize) -> Coord {
        self.board_spots[idx]
    }

    #[inline]
    pub fn region(&self, c: Coord) -> Option<Region> {
        self.spot_index(c).map(|i| self.regions[i])
    }

    #[inline]
    pub fn region_at(&self, idx: usize) -> Region {
        self.regions[idx]
    }

    /// The color opposite `color`.
    #[inline]
    pub fn opposing(&self, color: Color) -> Color {
        color.opposing()
    }

    /// Heuristic advancement of a spot for `color`. Larger is closer to the
    /// opposing home.
    #[inline]
    pub fn progress(&self, color: Color, c: Coord) -> i32 {
        let s = PROGRESS_SIGNS[color.index()];
        s[0] * c.x + s[1] * c.y + s[2] * c.z
    }

    /// All spots with `c.axis(axis) == value`, sorted along the next axis.
    pub fn axis_line(&self, axis: usize, value: i32) -> &[usize] {
        self.lines[axis % 3].get(&value).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Spot indices of the straight line from `from` to `to`, both ends
    /// included, in ascending order along the line.
    ///
    /// The line runs along the first axis on which both spots share a
    /// component. Returns `None` when no axis is shared or either spot is off
    /// the board.
    pub fn line_indices(&self, from: Coord, to: Coord) -> Option<&[usize]> {
        let axis = (0..3).find(|&d| from.axis(d) == to.axis(d))?;
        let next = (axis + 1) % 3;
        let line = self.axis_line(axis, from.axis(axis));
        let a = line.binary_search_by_key(&from.axis(next), |&i| self.board_spots[i].axis(next)).ok()?;
        let b = line.binary_search_by_key(&to.axis(next), |&i| self.board_spots[i].axis(next)).ok()?;
        Some(&line[a.min(b)..=a.max(b)])
    }

    /// Like [`Board::line_indices`] but as coordinates.
    pub fn get_line(&self, from: Coord, to: Coord) -> Option<Vec<Coord>> {
        self.line_indices(from, to)
            .map(|line| line.iter().map(|&i| self.board_spots[i]).collect())
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(4)
    }
}

#[inline]
fn in_field(n: i32, c: Coord) -> bool {
    c.norm() <= 2 * n
}

/// The red home, read off the board layout.
#[inline]
fn in_first_home(n: i32, c: Coord) -> bool {
    c.x > n && c.y >= -n && c.z <= n
}

/// Every lattice point with all components in `[-radius, radius]`.
fn hexgrid(radius: i32) -> Vec<Coord> {
    let mut out = Vec::new();
    for x in -radius..=radius {
        let lo = (-radius).max(-radius - x);
        let hi = radius.min(radius - x);
        for y in lo..=hi {
            out.push(Coord::new(x, y, x + y));
        }
    }
    out
}
