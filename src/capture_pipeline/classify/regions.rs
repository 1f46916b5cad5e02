/// Areas, in pixels, of the outer boundaries of the 8-connected foreground
/// regions of `mask`.
///
/// Each region is measured with its enclosed holes filled, so a bright
/// outline around a dark patch counts the whole enclosed extent. Regions
/// nested inside another region's hole merge into the outer one and are not
/// reported separately.
pub fn region_areas(mask: &[bool], width: usize, height: usize) -> Vec<usize> {
    debug_assert_eq!(mask.len(), width * height);
    let filled = fill_holes(mask, width, height);
    let mut visited = vec![false; filled.len()];
    let mut areas = Vec::new();
    let mut stack = Vec::new();

    for start in 0..filled.len() {
        if !filled[start] || visited[start] {
            continue;
        }
        visited[start] = true;
        stack.push(start);
        let mut area = 0usize;

        while let Some(index) = stack.pop() {
            area += 1;
            for neighbour in neighbours(index, width, height, true) {
                if filled[neighbour] && !visited[neighbour] {
                    visited[neighbour] = true;
                    stack.push(neighbour);
                }
            }
        }
        areas.push(area);
    }
    areas
}

/// Marks every background pixel that cannot reach the frame border as
/// foreground. Background is walked 4-connected, the dual of 8-connected
/// foreground.
fn fill_holes(mask: &[bool], width: usize, height: usize) -> Vec<bool> {
    let mut outside = vec![false; mask.len()];
    let mut stack = Vec::new();

    for index in 0..mask.len() {
        let (x, y) = (index % width, index / width);
        let on_border = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
        if on_border && !mask[index] {
            outside[index] = true;
            stack.push(index);
        }
    }

    while let Some(index) = stack.pop() {
        for neighbour in neighbours(index, width, height, false) {
            if !mask[neighbour] && !outside[neighbour] {
                outside[neighbour] = true;
                stack.push(neighbour);
            }
        }
    }

    outside.iter().map(|reached| !reached).collect()
}

fn neighbours(
    index: usize,
    width: usize,
    height: usize,
    diagonal: bool,
) -> impl Iterator<Item = usize> {
    let (x, y) = ((index % width) as isize, (index / width) as isize);
    (-1isize..=1)
        .flat_map(|dy| (-1isize..=1).map(move |dx| (dx, dy)))
        .filter(move |&(dx, dy)| (dx != 0 || dy != 0) && (diagonal || dx == 0 || dy == 0))
        .filter_map(move |(dx, dy)| {
            let (nx, ny) = (x + dx, y + dy);
            if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                None
            } else {
                Some(ny as usize * width + nx as usize)
            }
        })
}
