//! Gives fully transparent pixels the color of their nearest visible
//! neighbours. Favicons often store their transparent area as black, and a
//! Lanczos resize would otherwise smear that black into the visible edge.
//! Alpha is never touched.

use bit_vec::BitVec;
use image::{Rgba, RgbaImage};

const NEIGHBOURS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

pub fn bleed_transparent_edges(img: &mut RgbaImage) {
    let (width, height) = img.dimensions();
    let index = |x: u32, y: u32| (y * width + x) as usize;
    let len = (width * height) as usize;

    // `colored`: pixel holds a color worth sampling.
    // `reached`: pixel is colored or already waiting in a frontier.
    let mut colored = BitVec::from_elem(len, false);
    let mut reached = BitVec::from_elem(len, false);

    for (x, y, pixel) in img.enumerate_pixels() {
        if pixel[3] != 0 {
            colored.set(index(x, y), true);
            reached.set(index(x, y), true);
        }
    }

    let mut frontier = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if reached[index(x, y)] {
                continue;
            }
            let mut around = neighbours(x, y, width, height);
            if around.any(|(nx, ny)| colored[index(nx, ny)]) {
                reached.set(index(x, y), true);
                frontier.push((x, y));
            }
        }
    }

    while !frontier.is_empty() {
        let mut next = Vec::new();
        let mut filled = Vec::with_capacity(frontier.len());

        for &(x, y) in &frontier {
            let mut sum = [0u32; 3];
            let mut count = 0u32;

            for (nx, ny) in neighbours(x, y, width, height) {
                let i = index(nx, ny);
                if colored[i] {
                    let source = img.get_pixel(nx, ny);
                    for (acc, channel) in sum.iter_mut().zip(source.0) {
                        *acc += channel as u32;
                    }
                    count += 1;
                } else if !reached[i] {
                    reached.set(i, true);
                    next.push((nx, ny));
                }
            }

            let count = count.max(1);
            let average = sum.map(|c| (c / count) as u8);
            filled.push((x, y, Rgba([average[0], average[1], average[2], 0])));
        }

        // Colors land only after the whole ring is computed so a ring never
        // samples itself.
        for (x, y, pixel) in filled {
            img.put_pixel(x, y, pixel);
            colored.set(index(x, y), true);
        }
        frontier = next;
    }
}

fn neighbours(x: u32, y: u32, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    NEIGHBOURS.iter().filter_map(move |&(dx, dy)| {
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        (nx < width && ny < height).then_some((nx, ny))
    })
}
