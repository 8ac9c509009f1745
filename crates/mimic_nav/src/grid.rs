//! Grid navigation mesh with A* pathfinding
//!
//! Cells are square and share one floor height. Each cell carries a single
//! area type; blocked cells carry [`AreaMask::NONE`]. Off-mesh links join two
//! cells regardless of adjacency and are reported on the resulting path so
//! the agent can hand the crossing over to the movement controller.

use crate::error::{NavError, Result};
use crate::navigator::NavQuery;
use crate::path::{AreaMask, LinkKind, NavPath, OffMeshLinkData, PathLink, PathStatus};
use mimic_math::Vec3;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone)]
struct GridLink {
    from: usize,
    to: usize,
    data: OffMeshLinkData,
}

/// Uniform grid navigation data
#[derive(Debug, Clone)]
pub struct NavGrid {
    origin: Vec3,
    cell_size: f32,
    width: usize,
    depth: usize,
    areas: Vec<AreaMask>,
    links: Vec<GridLink>,
}

#[derive(Clone, Copy)]
enum Via {
    Step,
    Link(usize),
}

#[derive(Clone, Copy)]
struct OpenNode {
    idx: usize,
    f: f32,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap pops the lowest f first
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.idx.cmp(&self.idx))
    }
}

struct Corner {
    point: Vec3,
    link: Option<usize>,
    locked: bool,
}

impl NavGrid {
    /// Create a fully walkable grid
    pub fn new(width: usize, depth: usize, cell_size: f32, origin: Vec3) -> Result<Self> {
        if width == 0 || depth == 0 {
            return Err(NavError::EmptyMap);
        }
        if !(cell_size > 0.0) {
            return Err(NavError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            origin,
            cell_size,
            width,
            depth,
            areas: vec![AreaMask::WALKABLE; width * depth],
            links: Vec::new(),
        })
    }

    /// Build from text rows: `.` walkable, `~` crawlspace, `#` blocked.
    ///
    /// Row index maps to Z, column index to X. Short rows are padded with
    /// blocked cells.
    pub fn from_rows<S: AsRef<str>>(rows: &[S], cell_size: f32, origin: Vec3) -> Result<Self> {
        let depth = rows.len();
        let width = rows
            .iter()
            .map(|r| r.as_ref().chars().count())
            .max()
            .unwrap_or(0);

        let mut grid = Self::new(width, depth, cell_size, origin)?;
        grid.areas.fill(AreaMask::NONE);

        for (z, row) in rows.iter().enumerate() {
            for (x, glyph) in row.as_ref().chars().enumerate() {
                let area = match glyph {
                    '.' => AreaMask::WALKABLE,
                    '~' => AreaMask::CRAWL,
                    '#' => AreaMask::NONE,
                    other => {
                        return Err(NavError::UnknownGlyph {
                            glyph: other,
                            row: z,
                            column: x,
                        })
                    }
                };
                grid.areas[z * width + x] = area;
            }
        }

        log::debug!("Built {}x{} nav grid (cell {})", width, depth, cell_size);
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Floor height shared by every cell
    pub fn floor_height(&self) -> f32 {
        self.origin.y
    }

    /// Change the area type of one cell
    pub fn set_area(&mut self, x: usize, z: usize, area: AreaMask) {
        if x < self.width && z < self.depth {
            self.areas[z * self.width + x] = area;
        }
    }

    /// Grid coordinates of the cell containing `point`
    pub fn cell_coords(&self, point: Vec3) -> Option<(usize, usize)> {
        let fx = ((point.x - self.origin.x) / self.cell_size).floor();
        let fz = ((point.z - self.origin.z) / self.cell_size).floor();
        if fx < 0.0 || fz < 0.0 {
            return None;
        }
        let (x, z) = (fx as usize, fz as usize);
        if x >= self.width || z >= self.depth {
            return None;
        }
        Some((x, z))
    }

    fn cell_index(&self, point: Vec3) -> Option<usize> {
        self.cell_coords(point).map(|(x, z)| z * self.width + x)
    }

    /// World-space centre of a cell
    pub fn cell_centre(&self, x: usize, z: usize) -> Vec3 {
        Vec3::new(
            self.origin.x + (x as f32 + 0.5) * self.cell_size,
            self.origin.y,
            self.origin.z + (z as f32 + 0.5) * self.cell_size,
        )
    }

    fn centre_of(&self, idx: usize) -> Vec3 {
        self.cell_centre(idx % self.width, idx / self.width)
    }

    fn flatten(&self, point: Vec3) -> Vec3 {
        point.with_y(self.origin.y)
    }

    fn passable(&self, idx: usize, mask: AreaMask) -> bool {
        self.areas[idx].intersects(mask)
    }

    /// Area type under `point` (NONE when off-grid)
    pub fn area_at(&self, point: Vec3) -> AreaMask {
        self.cell_index(point)
            .map_or(AreaMask::NONE, |idx| self.areas[idx])
    }

    /// Register a bidirectional off-mesh link between two traversable cells
    pub fn add_link(&mut self, start: Vec3, end: Vec3, kind: LinkKind) -> Result<usize> {
        let from = self
            .cell_index(start)
            .filter(|&i| !self.areas[i].is_empty())
            .ok_or(NavError::LinkEndpointOffMesh(start))?;
        let to = self
            .cell_index(end)
            .filter(|&i| !self.areas[i].is_empty())
            .ok_or(NavError::LinkEndpointOffMesh(end))?;

        self.links.push(GridLink {
            from,
            to,
            data: OffMeshLinkData::new(self.flatten(start), self.flatten(end), kind),
        });
        Ok(self.links.len() - 1)
    }

    /// Registered links
    pub fn links(&self) -> impl Iterator<Item = &OffMeshLinkData> {
        self.links.iter().map(|l| &l.data)
    }

    fn neighbours(&self, idx: usize, out: &mut Vec<(usize, Via, f32)>) {
        out.clear();
        let (x, z) = (idx % self.width, idx / self.width);
        if x > 0 {
            out.push((idx - 1, Via::Step, self.cell_size));
        }
        if x + 1 < self.width {
            out.push((idx + 1, Via::Step, self.cell_size));
        }
        if z > 0 {
            out.push((idx - self.width, Via::Step, self.cell_size));
        }
        if z + 1 < self.depth {
            out.push((idx + self.width, Via::Step, self.cell_size));
        }
        for (li, link) in self.links.iter().enumerate() {
            let cost = link.data.length().max(f32::EPSILON);
            if link.from == idx {
                out.push((link.to, Via::Link(li), cost));
            } else if link.to == idx {
                out.push((link.from, Via::Link(li), cost));
            }
        }
    }

    /// A* search between two points.
    ///
    /// Returns `None` only when `start` is not on a cell allowed by `mask`.
    /// When the goal cannot be reached the path ends at the explored cell
    /// closest to it and is marked [`PathStatus::Partial`].
    pub fn find_path(&self, start: Vec3, goal: Vec3, mask: AreaMask) -> Option<NavPath> {
        let start_idx = self.cell_index(start).filter(|&i| self.passable(i, mask))?;
        let goal_idx = self.cell_index(goal).filter(|&i| self.passable(i, mask));
        let start_flat = self.flatten(start);
        let goal_flat = self.flatten(goal);

        if goal_idx == Some(start_idx) {
            return Some(NavPath::new(vec![start_flat, goal_flat], PathStatus::Complete));
        }

        let cells = self.areas.len();
        let heuristic = |idx: usize| self.centre_of(idx).distance(goal_flat);

        let mut g_score = vec![f32::INFINITY; cells];
        let mut came_from: Vec<Option<(usize, Via)>> = vec![None; cells];
        let mut closed = vec![false; cells];
        let mut open = BinaryHeap::new();
        let mut scratch = Vec::new();

        g_score[start_idx] = 0.0;
        open.push(OpenNode {
            idx: start_idx,
            f: heuristic(start_idx),
        });

        let mut best = (start_idx, heuristic(start_idx));
        let mut reached = None;

        while let Some(current) = open.pop() {
            if closed[current.idx] {
                continue;
            }
            closed[current.idx] = true;

            if Some(current.idx) == goal_idx {
                reached = Some(current.idx);
                break;
            }

            let h = heuristic(current.idx);
            if h < best.1 {
                best = (current.idx, h);
            }

            self.neighbours(current.idx, &mut scratch);
            for &(next, via, cost) in &scratch {
                if closed[next] || !self.passable(next, mask) {
                    continue;
                }
                let tentative = g_score[current.idx] + cost;
                if tentative < g_score[next] {
                    g_score[next] = tentative;
                    came_from[next] = Some((current.idx, via));
                    open.push(OpenNode {
                        idx: next,
                        f: tentative + heuristic(next),
                    });
                }
            }
        }

        let (end, status) = match reached {
            Some(idx) => (idx, PathStatus::Complete),
            None => (best.0, PathStatus::Partial),
        };

        // Walk back to the start
        let mut steps = Vec::new();
        let mut cursor = end;
        while let Some((prev, via)) = came_from[cursor] {
            steps.push((prev, cursor, via));
            cursor = prev;
        }
        steps.reverse();

        let mut corners = vec![Corner {
            point: start_flat,
            link: None,
            locked: true,
        }];

        for (prev, cell, via) in steps {
            match via {
                Via::Step => push_step(&mut corners, self.centre_of(cell)),
                Via::Link(li) => {
                    let link = &self.links[li];
                    let (entry, exit) = if link.from == prev {
                        (link.data.start, link.data.end)
                    } else {
                        (link.data.end, link.data.start)
                    };
                    match corners.last_mut() {
                        Some(last) if !last.locked => {
                            last.point = entry;
                            last.link = Some(li);
                            last.locked = true;
                        }
                        _ => corners.push(Corner {
                            point: entry,
                            link: Some(li),
                            locked: true,
                        }),
                    }
                    corners.push(Corner {
                        point: exit,
                        link: None,
                        locked: true,
                    });
                }
            }
        }

        if status == PathStatus::Complete {
            match corners.last_mut() {
                Some(last) if !last.locked => last.point = goal_flat,
                _ => corners.push(Corner {
                    point: goal_flat,
                    link: None,
                    locked: true,
                }),
            }
        }

        let links = corners
            .iter()
            .enumerate()
            .filter_map(|(i, c)| {
                c.link.map(|li| PathLink {
                    segment: i,
                    link: self.links[li].data,
                })
            })
            .collect();

        Some(NavPath::new(corners.into_iter().map(|c| c.point).collect(), status).with_links(links))
    }

    /// Nearest point on a cell allowed by `mask`, within `max_distance`
    pub fn sample_position(&self, point: Vec3, max_distance: f32, mask: AreaMask) -> Option<Vec3> {
        let flat = self.flatten(point);
        if let Some(idx) = self.cell_index(point) {
            if self.passable(idx, mask) {
                return Some(flat);
            }
        }

        let radius = (max_distance.max(0.0) / self.cell_size).ceil() as i64;
        let cx = ((point.x - self.origin.x) / self.cell_size).floor() as i64;
        let cz = ((point.z - self.origin.z) / self.cell_size).floor() as i64;

        let mut best: Option<(f32, Vec3)> = None;
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let (x, z) = (cx + dx, cz + dz);
                if x < 0 || z < 0 || x >= self.width as i64 || z >= self.depth as i64 {
                    continue;
                }
                let idx = z as usize * self.width + x as usize;
                if !self.passable(idx, mask) {
                    continue;
                }
                let centre = self.centre_of(idx);
                let d = centre.distance(flat);
                if d > max_distance {
                    continue;
                }
                match best {
                    Some((best_d, _)) if best_d <= d => {}
                    _ => best = Some((d, centre)),
                }
            }
        }

        best.map(|(_, p)| p)
    }
}

fn push_step(corners: &mut Vec<Corner>, point: Vec3) {
    let len = corners.len();
    if len >= 2 {
        let prev = corners[len - 2].point;
        let last = &corners[len - 1];
        if !last.locked && collinear(prev, last.point, point) {
            corners[len - 1].point = point;
            return;
        }
    }
    corners.push(Corner {
        point,
        link: None,
        locked: false,
    });
}

fn collinear(a: Vec3, b: Vec3, c: Vec3) -> bool {
    let ab = (b - a).horizontal();
    let bc = (c - b).horizontal();
    let cross = ab.x * bc.z - ab.z * bc.x;
    cross.abs() < 1e-4 && ab.dot(bc) > 0.0
}

impl NavQuery for NavGrid {
    fn calculate_path(&self, from: Vec3, to: Vec3, mask: AreaMask) -> Option<NavPath> {
        self.find_path(from, to, mask)
    }

    fn sample_position(&self, point: Vec3, max_distance: f32, mask: AreaMask) -> Option<Vec3> {
        NavGrid::sample_position(self, point, max_distance, mask)
    }
}
