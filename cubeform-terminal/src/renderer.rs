//! ASCII rasterizer for terminal rendering
use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use cubeform_core::{triangle_normal, PolygonOffset, RenderTarget};
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::Write;

use crate::camera::{Camera, ScreenPoint};

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Smallest depth difference the offset's `units` term stands for
const DEPTH_RESOLUTION: f32 = 1e-4;

/// Edges drawn in wireframe mode
const WIRE_COLOR: Color = Color::White;

/// Edges drawn over filled faces
const OVERLAY_COLOR: Color = Color::DarkGrey;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub color: Color,
}

impl Cell {
    const EMPTY: Cell = Cell {
        ch: ' ',
        color: Color::Reset,
    };
}

/// ASCII renderer that converts 3D primitives to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    camera: Camera,
    view_projection: Matrix4<f32>,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
    depth_test: bool,
    polygon_offset: Option<PolygonOffset>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize, mut camera: Camera) -> Self {
        let size = width * height;
        camera.resize(width as u32, height as u32);
        Self {
            width,
            height,
            view_projection: camera.view_projection(),
            camera,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![Cell::EMPTY; size],
            depth_test: false,
            polygon_offset: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.camera.resize(width as u32, height as u32);
        self.view_projection = self.camera.view_projection();
        self.depth_buffer = vec![f32::INFINITY; width * height];
        self.cells = vec![Cell::EMPTY; width * height];
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(Cell::EMPTY);
    }

    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells[y * self.width + x]
    }

    /// Number of cells holding something other than a blank
    pub fn covered_cells(&self) -> usize {
        self.cells.iter().filter(|cell| cell.ch != ' ').count()
    }

    fn project(&self, point: &Point3<f32>) -> Option<ScreenPoint> {
        self.camera.project_to_screen(
            &self.view_projection,
            point,
            self.width as u32,
            self.height as u32,
        )
    }

    /// Write a fragment, honouring the depth test when it is enabled
    fn plot(&mut self, x: i32, y: i32, depth: f32, cell: Cell) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }

        let idx = y as usize * self.width + x as usize;
        if self.depth_test {
            if depth >= self.depth_buffer[idx] {
                return;
            }
            self.depth_buffer[idx] = depth;
        }
        self.cells[idx] = cell;
    }

    fn shade(triangle: &[Point3<f32>; 3], light_dir: &Vector3<f32>) -> char {
        // Faces wound away from the light get the dimmest mark
        let brightness = triangle_normal(triangle)
            .map_or(0.0, |normal| normal.dot(light_dir).max(0.0));

        // Never pick the blank so every face stays visible
        let char_index = 1 + (brightness * (LUMINOSITY_RAMP.len() - 2) as f32).round() as usize;
        LUMINOSITY_RAMP[char_index.min(LUMINOSITY_RAMP.len() - 1)]
    }

    fn rasterize_triangle(&mut self, coords: &[ScreenPoint; 3], character: char) {
        let [v0, v1, v2] = *coords;

        // Bounding box, clipped to screen bounds
        let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as i32;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil().min(self.width as f32 - 1.0) as i32;
        let min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as i32;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil().min(self.height as f32 - 1.0) as i32;

        let offset = self
            .polygon_offset
            .map_or(0.0, |offset| polygon_offset_depth(coords, &offset));
        let cell = Cell {
            ch: character,
            color: Color::White,
        };

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates
                if let Some((w0, w1, w2)) =
                    barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), (px, py))
                {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        // Interpolate depth relative to v2, exact for flat faces
                        let depth = v2.depth
                            + w0 * (v0.depth - v2.depth)
                            + w1 * (v1.depth - v2.depth);
                        self.plot(x, y, depth + offset, cell);
                    }
                }
            }
        }
    }

    fn rasterize_line(&mut self, a: ScreenPoint, b: ScreenPoint, color: Color) {
        let Some((a, b)) = clip_line(a, b, self.width as f32, self.height as f32) else {
            return;
        };

        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i32;
        let cell = Cell {
            ch: line_char(dx, dy),
            color,
        };

        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (a.x + dx * t).floor() as i32;
            let y = (a.y + dy * t).floor() as i32;
            let depth = a.depth + (b.depth - a.depth) * t;
            self.plot(x, y, depth, cell);
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W, top_row: u16) -> std::io::Result<()> {
        let mut current = None;

        for y in 0..self.height {
            writer.queue(MoveTo(0, top_row + y as u16))?;
            for x in 0..self.width {
                let cell = self.cells[y * self.width + x];

                // Only switch colour when it changes
                if current != Some(cell.color) {
                    writer.queue(SetForegroundColor(cell.color))?;
                    current = Some(cell.color);
                }
                writer.queue(Print(cell.ch))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl RenderTarget for AsciiRenderer {
    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn set_polygon_offset(&mut self, offset: Option<PolygonOffset>) {
        self.polygon_offset = offset;
    }

    fn draw_lines(&mut self, lines: &[[Point3<f32>; 2]]) {
        let color = if self.depth_test {
            OVERLAY_COLOR
        } else {
            WIRE_COLOR
        };

        for [a, b] in lines {
            if let (Some(a), Some(b)) = (self.project(a), self.project(b)) {
                self.rasterize_line(a, b, color);
            }
        }
    }

    fn draw_triangles(&mut self, triangles: &[[Point3<f32>; 3]]) {
        let light_dir = (self.camera.position - self.camera.target).normalize();

        for triangle in triangles {
            let projected = [
                self.project(&triangle[0]),
                self.project(&triangle[1]),
                self.project(&triangle[2]),
            ];
            // Triangle is clipped
            if let [Some(a), Some(b), Some(c)] = projected {
                let character = Self::shade(triangle, &light_dir);
                self.rasterize_triangle(&[a, b, c], character);
            }
        }
    }
}

/// Depth pushed onto a triangle's fragments: `factor * slope + units * r`
fn polygon_offset_depth(coords: &[ScreenPoint; 3], offset: &PolygonOffset) -> f32 {
    let [v0, v1, v2] = *coords;
    let e1 = Vector3::new(v1.x - v0.x, v1.y - v0.y, v1.depth - v0.depth);
    let e2 = Vector3::new(v2.x - v0.x, v2.y - v0.y, v2.depth - v0.depth);
    let n = e1.cross(&e2);

    // Edge-on triangles have no usable slope
    let slope = if n.z.abs() < 1e-9 {
        0.0
    } else {
        (n.x / n.z).abs().max((n.y / n.z).abs())
    };

    offset.factor * slope + offset.units * DEPTH_RESOLUTION
}

/// Liang-Barsky clip of a screen segment to `[0, width] x [0, height]`.
///
/// Depth is interpolated along with the position. `None` when the segment
/// misses the screen.
fn clip_line(
    a: ScreenPoint,
    b: ScreenPoint,
    width: f32,
    height: f32,
) -> Option<(ScreenPoint, ScreenPoint)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;

    for (p, q) in [
        (-dx, a.x),
        (dx, width - a.x),
        (-dy, a.y),
        (dy, height - a.y),
    ] {
        if p == 0.0 {
            // Parallel to this edge
            if q < 0.0 {
                return None;
            }
        } else {
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
        }
    }
    if t0 > t1 {
        return None;
    }

    let at = |t: f32| ScreenPoint {
        x: a.x + dx * t,
        y: a.y + dy * t,
        depth: a.depth + (b.depth - a.depth) * t,
    };
    Some((at(t0), at(t1)))
}

fn line_char(dx: f32, dy: f32) -> char {
    if dx.abs() >= 2.0 * dy.abs() {
        '-'
    } else if dy.abs() >= 2.0 * dx.abs() {
        '|'
    } else if (dx > 0.0) == (dy > 0.0) {
        // Screen y grows downwards
        '\\'
    } else {
        '/'
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubeform_core::render::SOLID_POLYGON_OFFSET;
    use cubeform_core::{dispatch, Geometry};

    fn make_renderer() -> AsciiRenderer {
        AsciiRenderer::new(80, 24, Camera::new(80, 24))
    }

    #[test]
    fn test_barycentric_centroid() {
        let (w0, w1, w2) = barycentric((0.0, 0.0), (3.0, 0.0), (0.0, 3.0), (1.0, 1.0)).unwrap();
        assert!((w0 - 1.0 / 3.0).abs() < 1e-6);
        assert!((w1 - 1.0 / 3.0).abs() < 1e-6);
        assert!((w2 - 1.0 / 3.0).abs() < 1e-6);
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 1.0)).is_none());
    }

    #[test]
    fn test_line_chars() {
        assert_eq!(line_char(10.0, 0.0), '-');
        assert_eq!(line_char(0.0, -5.0), '|');
        assert_eq!(line_char(3.0, 3.0), '\\');
        assert_eq!(line_char(3.0, -3.0), '/');
    }

    #[test]
    fn test_wireframe_cube_draws_edges_only() {
        let cube = Geometry::cube();
        let mut renderer = make_renderer();
        dispatch(&cube, cube.vertices(), false, &mut renderer);

        let covered = renderer.covered_cells();
        assert!(covered > 0);
        // The centre of the front face is empty in wireframe
        assert_eq!(renderer.cell(40, 12), Cell::EMPTY);
        assert!(renderer
            .cells
            .iter()
            .filter(|cell| cell.ch != ' ')
            .all(|cell| cell.color == WIRE_COLOR));
    }

    #[test]
    fn test_solid_cube_fills_centre() {
        let cube = Geometry::cube();
        let mut renderer = make_renderer();
        dispatch(&cube, cube.vertices(), true, &mut renderer);

        let centre = renderer.cell(40, 12);
        assert_ne!(centre.ch, ' ');
        assert_eq!(centre.color, Color::White);
        assert!(renderer.covered_cells() > 50);
    }

    #[test]
    fn test_overlay_survives_offset_faces() {
        // A line lying exactly on a filled triangle wins thanks to the offset
        let tri = [[
            Point3::new(-2.0, -2.0, 0.0),
            Point3::new(2.0, -2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ]];
        let line = [[Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)]];

        let mut renderer = make_renderer();
        renderer.set_depth_test(true);
        renderer.set_polygon_offset(Some(SOLID_POLYGON_OFFSET));
        renderer.draw_triangles(&tri);
        renderer.draw_lines(&line);
        assert_eq!(renderer.cell(40, 12).color, OVERLAY_COLOR);

        let mut renderer = make_renderer();
        renderer.set_depth_test(true);
        renderer.set_polygon_offset(None);
        renderer.draw_triangles(&tri);
        renderer.draw_lines(&line);
        assert_eq!(renderer.cell(40, 12).color, Color::White);
    }

    #[test]
    fn test_depth_test_off_draws_in_order() {
        let near = [[Point3::new(-1.0, 0.0, 1.0), Point3::new(1.0, 0.0, 1.0)]];
        let far = [[Point3::new(-1.0, 0.0, -1.0), Point3::new(1.0, 0.0, -1.0)]];

        let mut renderer = make_renderer();
        renderer.set_depth_test(true);
        renderer.draw_lines(&near);
        renderer.draw_lines(&far);
        assert_eq!(renderer.cell(40, 12).color, OVERLAY_COLOR);

        // Without the test the farther line overwrites the nearer one
        renderer.set_depth_test(false);
        renderer.draw_lines(&far);
        assert_eq!(renderer.cell(40, 12).color, WIRE_COLOR);
    }

    fn screen_point(x: f32, y: f32, depth: f32) -> ScreenPoint {
        ScreenPoint { x, y, depth }
    }

    #[test]
    fn test_clip_line_to_screen() {
        let (a, b) = clip_line(
            screen_point(-1.0e6, 5.5, 0.0),
            screen_point(1.0e6, 5.5, 1.0),
            80.0,
            24.0,
        )
        .unwrap();
        assert_eq!(a.x, 0.0);
        assert!((b.x - 80.0).abs() < 0.1);
        // Depth follows the original segment
        assert!((a.depth - 0.5).abs() < 1e-3);

        let inside = clip_line(screen_point(1.0, 1.0, 0.2), screen_point(9.0, 3.0, 0.4), 80.0, 24.0);
        let (a, b) = inside.unwrap();
        assert_eq!((a.x, a.y, a.depth), (1.0, 1.0, 0.2));
        assert_eq!((b.x, b.y, b.depth), (9.0, 3.0, 0.4));

        assert!(clip_line(screen_point(-5.0, -5.0, 0.0), screen_point(-1.0, 30.0, 0.0), 80.0, 24.0)
            .is_none());
        assert!(clip_line(screen_point(-5.0, 30.0, 0.0), screen_point(90.0, 30.0, 0.0), 80.0, 24.0)
            .is_none());
    }

    #[test]
    fn test_far_off_screen_line_draws_visible_part() {
        let mut renderer = make_renderer();
        renderer.rasterize_line(
            screen_point(-1.0e6, 5.5, 0.0),
            screen_point(1.0e6, 5.5, 0.0),
            WIRE_COLOR,
        );
        assert_eq!(renderer.covered_cells(), 80);
        assert!((0..80).all(|x| renderer.cell(x, 5).ch == '-'));
    }

    #[test]
    fn test_shading_follows_winding() {
        let light = Vector3::z();
        let facing = [
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let away = [facing[0], facing[2], facing[1]];

        assert_eq!(AsciiRenderer::shade(&facing, &light), '@');
        assert_eq!(AsciiRenderer::shade(&away, &light), '.');
    }

    #[test]
    fn test_resize_reallocates() {
        let mut renderer = make_renderer();
        renderer.resize(20, 10);
        assert_eq!(renderer.width(), 20);
        assert_eq!(renderer.height(), 10);
        assert_eq!(renderer.covered_cells(), 0);
    }

    #[test]
    fn test_draw_emits_every_row() {
        let renderer = AsciiRenderer::new(4, 3, Camera::default());
        let mut out = Vec::new();
        renderer.draw(&mut out, 1).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(' ').count(), 12);
    }
}
