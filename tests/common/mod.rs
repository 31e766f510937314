// SPDX-License-Identifier: GPL-3.0-only

//! Shared test fixtures

use image::{Rgba, RgbaImage};

/// Version 1-M QR code for "ABC123" (byte mode, mask 2)
pub const ABC123: [&str; 21] = [
    "#######..#.##.#######",
    "#.....#..#..#.#.....#",
    "#.###.#.###.#.#.###.#",
    "#.###.#.#.....#.###.#",
    "#.###.#.#####.#.###.#",
    "#.....#.##..#.#.....#",
    "#######.#.#.#.#######",
    "........#.###........",
    "#.#####..##.#.#####..",
    "..##.#.#.#..#..#..#..",
    "####.###..##.#..#..#.",
    ".###...#.#.....#####.",
    "..#...##..##.#..#.#..",
    "........#.######..#..",
    "#######...#.#.##.#.#.",
    "#.....#.#..####.#.#.#",
    "#.###.#.#.#.#..#.#.#.",
    "#.###.#.###.#...#.#..",
    "#.###.#.####.#.#.##..",
    "#.....#..##....##.#..",
    "#######.##.#.#.#.#.#.",
];

const QUIET_ZONE: u32 = 4;

/// Render the module matrix with a white quiet zone
pub fn render(module_px: u32) -> RgbaImage {
    let modules = ABC123.len() as u32 + 2 * QUIET_ZONE;
    let size = modules * module_px;

    RgbaImage::from_fn(size, size, |x, y| {
        let col = (x / module_px) as i64 - QUIET_ZONE as i64;
        let row = (y / module_px) as i64 - QUIET_ZONE as i64;
        let dark = row >= 0
            && col >= 0
            && ABC123
                .get(row as usize)
                .and_then(|line| line.as_bytes().get(col as usize))
                .is_some_and(|&c| c == b'#');
        if dark {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    })
}
