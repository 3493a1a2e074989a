use std::{f32::consts::PI, time::Instant};

use glium::{
    draw_parameters::PolygonOffset,
    glutin::{
        dpi::PhysicalPosition,
        event::{
            ElementState, Event, KeyboardInput, MouseButton, MouseScrollDelta, VirtualKeyCode,
            WindowEvent,
        },
        event_loop::{ControlFlow, EventLoop},
        window::WindowBuilder,
        ContextBuilder,
    },
    implement_vertex,
    index::PrimitiveType,
    uniform, Display, IndexBuffer, Program, Surface, VertexBuffer,
};
use itertools::{iproduct, Itertools};
use nalgebra::{Perspective3, Point2, Point3, Rotation3, Similarity3, Translation3, Vector3};
use nxcube::{
    cube::{Cube, CubeEvent},
    lattice::{Face, N_FACES},
    pick::{pick_ray, CameraBasis, SwipeDir},
    Color, Theme,
};
use strum::IntoEnumIterator;

// each vertex should have a color associated with it
#[derive(Clone, Copy)]
struct Vertex {
    position: [f32; 3],
    color: Color,
}

implement_vertex!(Vertex, position, color);

const PIECE_HALF_WIDTH: f32 = 0.5;

// world-space diameter of the whole cube, so every size renders at the same
// apparent scale
const CUBE_SPAN: f32 = 0.18;

const GREY: Color = [0.3, 0.3, 0.3];
const BLACK: Color = [0.0, 0.0, 0.0];

// a press that travels farther than this many pixels is an orbit drag, not a
// tap on a face
const TAP_THRESHOLD: f64 = 4.0;

// long idle gaps between redraws must not teleport a turn to completion
const MAX_FRAME_DT: f32 = 0.05;

// for tracking the current click state
#[derive(Default, Debug)]
enum DragState {
    #[default]
    Released,
    Pressed {
        button: MouseButton,
        start: (f64, f64),
        dragged: bool,
    },
}

fn face_indices(n_pieces: usize) -> Vec<u16> {
    const FACE_INDICES: [u16; 6] = [0, 1, 2, 1, 2, 3];

    let n_rects = n_pieces * N_FACES;

    (0..n_rects as u16)
        .cartesian_product(FACE_INDICES)
        .map(|(i, j)| 4 * i + j)
        .collect_vec()
}

fn edge_indices(n_pieces: usize) -> Vec<u16> {
    const EDGE_INDICES: [u16; 24] = [
        0, 1, 2, 3, 4, 5, 6, 7, 0, 2, 1, 3, 4, 6, 5, 7, 0, 4, 1, 5, 2, 6, 3, 7,
    ];

    (0..n_pieces as u16)
        .cartesian_product(EDGE_INDICES)
        .map(|(i, j)| 8 * i + j)
        .collect_vec()
}

// the four corners of each piece face, in Face order (left, right, down, up,
// back, front); corner index is 4*x + 2*y + z over low/high shifts
const CORNER_IDS: [[usize; 4]; N_FACES] = [
    [0, 1, 2, 3],
    [4, 5, 6, 7],
    [0, 1, 4, 5],
    [2, 3, 6, 7],
    [0, 2, 4, 6],
    [1, 3, 5, 7],
];

fn mouse_to_screen_coords(mouse_pos: (f64, f64), dimensions: (u32, u32)) -> Point2<f32> {
    let (click_x, click_y) = mouse_pos;
    let (width, height) = dimensions;
    // need to invert y because of how mouse coordinates work
    Point2::new(
        (2.0 * click_x / width as f64 - 1.0) as _,
        -(2.0 * click_y / height as f64 - 1.0) as _,
    )
}

/// Unprojects a screen point to a ray in cube space by running the near and
/// far plane points back through the perspective and model transforms.
fn pointer_ray(
    pos: Point2<f32>,
    model: &Similarity3<f32>,
    perspective: &Perspective3<f32>,
) -> (Point3<f32>, Vector3<f32>) {
    // NOTE: depth values range from -1 to 1, with the near plane at z = -1
    let near = Point3::new(pos.x, pos.y, -1.0);
    let far = Point3::new(pos.x, pos.y, 1.0);

    let inverse = |p| model.inverse_transform_point(&perspective.unproject_point(p));

    let start = inverse(&near);
    let end = inverse(&far);

    (start, end - start)
}

fn size_for_key(keycode: VirtualKeyCode) -> Option<usize> {
    match keycode {
        VirtualKeyCode::Key2 => Some(2),
        VirtualKeyCode::Key3 => Some(3),
        VirtualKeyCode::Key4 => Some(4),
        VirtualKeyCode::Key5 => Some(5),
        VirtualKeyCode::Key6 => Some(6),
        VirtualKeyCode::Key7 => Some(7),
        VirtualKeyCode::Key8 => Some(8),
        VirtualKeyCode::Key9 => Some(9),
        VirtualKeyCode::Key0 => Some(10),
        _ => None,
    }
}

fn lighten(color: Color) -> Color {
    color.map(|c| 0.5 + 0.5 * c)
}

fn main() {
    env_logger::builder().format_timestamp(None).init();

    let event_loop = EventLoop::new();
    let wb = WindowBuilder::new().with_title("nxcube");
    let cb = ContextBuilder::new()
        .with_depth_buffer(24)
        .with_vsync(false);

    let display = Display::new(wb, cb, &event_loop).unwrap();

    let corners = {
        let shifts = [-PIECE_HALF_WIDTH, PIECE_HALF_WIDTH].into_iter();
        iproduct!(shifts.clone(), shifts.clone(), shifts)
            .map(|(x, y, z)| Vector3::new(x, y, z))
            .collect_vec()
    };

    let vertex_shader_src = include_str!("vertex_shader.vert");
    let fragment_shader_src = include_str!("fragment_shader.frag");

    let program =
        Program::from_source(&display, vertex_shader_src, fragment_shader_src, None).unwrap();

    let mut cube = Cube::new(3);
    let theme = Theme::default();

    // the index buffers only depend on the piece count, so they are rebuilt
    // when a size key regenerates the lattice
    let mut index_pieces = cube.pieces().len();
    let mut face_index_buffer = IndexBuffer::new(
        &display,
        PrimitiveType::TrianglesList,
        &face_indices(index_pieces),
    )
    .unwrap();
    let mut edge_index_buffer = IndexBuffer::new(
        &display,
        PrimitiveType::LinesList,
        &edge_indices(index_pieces),
    )
    .unwrap();

    let mut mouse_pos = (0.0, 0.0);
    let mut state = DragState::default();
    let mut cube_rotation: Rotation3<f32> = Rotation3::default();
    let mut zoom = 1.0;
    let mut last_frame = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        if !matches!(
            event,
            Event::RedrawRequested(..) | Event::WindowEvent { .. }
        ) {
            return;
        }

        let dimensions = display.get_framebuffer_dimensions();

        let model = Similarity3::from_parts(
            Translation3::new(0.0, 0.0, -1.0 / zoom),
            cube_rotation.into(),
            CUBE_SPAN / cube.size() as f32,
        );

        let perspective = {
            let (width, height) = dimensions;
            Perspective3::new(width as f32 / height as f32, PI / 6.0, 0.1, 1024.0)
        };

        // NOTE: manually requesting redraws makes everything much faster!
        if let Event::RedrawRequested(..) = event {
            let dt = last_frame.elapsed().as_secs_f32().min(MAX_FRAME_DT);
            last_frame = Instant::now();

            for cube_event in cube.tick(dt) {
                if cube_event == CubeEvent::SequenceFinished {
                    log::info!("animation sequence finished");
                }
            }

            if index_pieces != cube.pieces().len() {
                index_pieces = cube.pieces().len();
                face_index_buffer = IndexBuffer::new(
                    &display,
                    PrimitiveType::TrianglesList,
                    &face_indices(index_pieces),
                )
                .unwrap();
                edge_index_buffer = IndexBuffer::new(
                    &display,
                    PrimitiveType::LinesList,
                    &edge_indices(index_pieces),
                )
                .unwrap();
            }

            let mut target = display.draw();

            const LIGHT_GREEN: (f32, f32, f32, f32) = (0.45, 0.91, 0.48, 1.0);
            const LIGHT_GREY: (f32, f32, f32, f32) = (0.9, 0.9, 0.9, 1.0);

            let background_color = if cube.is_solved() {
                LIGHT_GREEN
            } else {
                LIGHT_GREY
            };

            target.clear_color_and_depth(background_color, 1.0);

            const VERTS_PER_PIECE: usize = 24;
            const EDGES_PER_PIECE: usize = 8;

            let mut face_vertices: Vec<Vertex> = Vec::with_capacity(VERTS_PER_PIECE * index_pieces);
            let mut edge_vertices: Vec<Vertex> = Vec::with_capacity(EDGES_PER_PIECE * index_pieces);

            let transforms = cube.render_transforms();
            let selection = cube.selection().cloned();

            for (piece, (pos, rot)) in cube.pieces().iter().zip(&transforms) {
                for (face, corner_ids) in Face::iter().zip(CORNER_IDS) {
                    let mut color = if piece.has_sticker(face) {
                        theme.color(face)
                    } else {
                        GREY
                    };
                    let selected = selection
                        .as_ref()
                        .map_or(false, |s| s.piece == piece.id() && s.face == face);
                    if selected {
                        color = lighten(color);
                    }

                    for corner in corner_ids.map(|i| corners[i]) {
                        face_vertices.push(Vertex {
                            position: *(rot * corner + pos).as_ref(),
                            color,
                        });
                    }
                }

                for &corner in &corners {
                    edge_vertices.push(Vertex {
                        position: *(rot * corner + pos).as_ref(),
                        color: BLACK,
                    });
                }
            }

            let face_vertices = VertexBuffer::new(&display, &face_vertices).unwrap();

            let uniforms = uniform! {
                model: model.to_homogeneous().as_ref().to_owned(),
                perspective: perspective.as_matrix().as_ref().to_owned(),
            };

            let params = glium::DrawParameters {
                depth: glium::Depth {
                    test: glium::DepthTest::IfLess,
                    write: true,
                    ..Default::default()
                },
                line_width: Some(4.0),
                // NOTE: positive polygon offset = farther back
                polygon_offset: PolygonOffset {
                    fill: true,
                    units: 1.0,
                    ..Default::default()
                },
                ..Default::default()
            };

            target
                .draw(
                    &face_vertices,
                    &face_index_buffer,
                    &program,
                    &uniforms,
                    &params,
                )
                .unwrap();

            let edge_vertices = VertexBuffer::new(&display, &edge_vertices).unwrap();
            target
                .draw(
                    &edge_vertices,
                    &edge_index_buffer,
                    &program,
                    &uniforms,
                    &params,
                )
                .unwrap();

            target.finish().unwrap();

            // keep redrawing while a turn or a queued sequence is in flight
            if cube.is_busy() {
                display.gl_window().window().request_redraw();
            }
        } else if let Event::WindowEvent { event, .. } = event {
            match event {
                WindowEvent::CloseRequested => {
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::MouseInput {
                    state: ElementState::Pressed,
                    button: button @ (MouseButton::Left | MouseButton::Right),
                    ..
                } => {
                    // in the case that a button is already pressed, we don't
                    // want to do anything
                    if !matches!(state, DragState::Released) {
                        return;
                    }

                    state = DragState::Pressed {
                        button,
                        start: mouse_pos,
                        dragged: false,
                    };
                }
                WindowEvent::MouseInput {
                    state: ElementState::Released,
                    button: released @ (MouseButton::Left | MouseButton::Right),
                    ..
                } => {
                    // the released button should match the one that was
                    // pressed, otherwise don't do anything
                    let DragState::Pressed { button, dragged, .. } = state else {
                        return;
                    };
                    if released != button {
                        return;
                    }

                    // a left press that never strayed past the tap threshold
                    // picks the face under the pointer; missing the cube
                    // dismisses the selection
                    if button == MouseButton::Left && !dragged {
                        let pos = mouse_to_screen_coords(mouse_pos, dimensions);
                        let (origin, dir) = pointer_ray(pos, &model, &perspective);

                        match pick_ray(cube.pieces(), origin, dir) {
                            Some((idx, local)) => {
                                let id = cube.pieces()[idx].id();
                                cube.select(id, local);
                            }
                            None => cube.clear_selection(),
                        }
                        display.gl_window().window().request_redraw();
                    }

                    state = DragState::Released;
                }
                WindowEvent::CursorMoved {
                    position: PhysicalPosition { x, y },
                    ..
                } => {
                    if let DragState::Pressed { start, dragged, .. } = &mut state {
                        let (sx, sy) = *start;
                        let travelled = ((x - sx).powi(2) + (y - sy).powi(2)).sqrt();

                        if *dragged || travelled > TAP_THRESHOLD {
                            *dragged = true;

                            const CUBE_ROTATION_RATE: f32 = 0.007;

                            // calculate a delta
                            let (x0, y0) = mouse_pos;
                            let (dx, dy) = ((x - x0) as f32, (y - y0) as f32);

                            // convert delta to a rotation
                            let d_rotation = Rotation3::from_scaled_axis(
                                Vector3::new(dy, dx, 0.0).scale(CUBE_ROTATION_RATE),
                            );

                            // and apply it
                            cube_rotation = d_rotation * cube_rotation;
                            display.gl_window().window().request_redraw();
                        }
                    }

                    mouse_pos = (x, y);
                }
                WindowEvent::MouseWheel {
                    delta: MouseScrollDelta::LineDelta(_, cols),
                    ..
                } => {
                    const ZOOM_STEP: f32 = 0.05;
                    const MIN_ZOOM: f32 = 0.5;
                    const MAX_ZOOM: f32 = 1.5;

                    zoom = (zoom + cols * ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
                    display.gl_window().window().request_redraw();
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(keycode),
                            ..
                        },
                    ..
                } => match keycode {
                    VirtualKeyCode::Q => {
                        *control_flow = ControlFlow::Exit;
                    }
                    VirtualKeyCode::R => {
                        // reset everything
                        cube.reset();
                        display.gl_window().window().request_redraw();
                    }
                    VirtualKeyCode::S => {
                        if cube.shuffle() {
                            display.gl_window().window().request_redraw();
                        }
                    }
                    VirtualKeyCode::Return => {
                        if cube.solve() {
                            display.gl_window().window().request_redraw();
                        }
                    }
                    VirtualKeyCode::H => {
                        if cube.hint().is_some() {
                            display.gl_window().window().request_redraw();
                        }
                    }
                    VirtualKeyCode::Escape => {
                        cube.clear_selection();
                        display.gl_window().window().request_redraw();
                    }
                    arrow @ (VirtualKeyCode::Up
                    | VirtualKeyCode::Down
                    | VirtualKeyCode::Left
                    | VirtualKeyCode::Right) => {
                        let dir = match arrow {
                            VirtualKeyCode::Up => SwipeDir::Up,
                            VirtualKeyCode::Down => SwipeDir::Down,
                            VirtualKeyCode::Left => SwipeDir::Left,
                            _ => SwipeDir::Right,
                        };

                        // the arrows are screen-relative, so the swipe basis
                        // is sampled from the live orbit rotation
                        let camera = CameraBasis {
                            right: cube_rotation.inverse_transform_vector(&Vector3::x()),
                            up: cube_rotation.inverse_transform_vector(&Vector3::y()),
                        };

                        if cube.swipe(dir, &camera) {
                            display.gl_window().window().request_redraw();
                        }
                    }
                    keycode => {
                        if let Some(size) = size_for_key(keycode) {
                            cube.set_size(size);
                            display.gl_window().window().request_redraw();
                        }
                    }
                },
                _ => {}
            }
        }
    });
}
