//! The engine: piece store, move queue, turn animation, commit and snap.
//!
//! All mutation happens inside [`Cube::tick`], which a host calls once per
//! frame with the elapsed time. The tick does a bounded amount of work and
//! returns the events it produced, so the engine runs the same under a
//! browser loop, a game loop, or a headless test driver.

use std::collections::VecDeque;
use std::f32::consts::FRAC_PI_2;

use nalgebra::{Point3, Rotation3, Vector3};

use crate::lattice::{generate_pieces, snap_coord, Face, Piece, LAYER_TOL};
use crate::moves::{shuffle_moves, solve_moves, Move};
use crate::pick::{
    locate_hint, move_for_swipe, pick_face, validate_pick, CameraBasis, Selection, SwipeDir,
};
use crate::rotation::{Axis, CubeRotation};
use crate::{MAX_SIZE, MIN_SIZE};

/// Angular rates in radians per second.
#[derive(Debug, Clone, Copy)]
pub struct TurnSpeeds {
    /// Rate of an isolated manual move.
    pub manual: f32,
    /// Rate of each move in a shuffle or solve playback.
    pub sequence: f32,
}

impl Default for TurnSpeeds {
    fn default() -> Self {
        Self {
            manual: 4.0,
            sequence: 16.0,
        }
    }
}

/// Events surfaced by [`Cube::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeEvent {
    /// A queued move committed (or was skipped as degenerate).
    MoveCompleted(Move),
    /// The queue drained.
    SequenceFinished,
}

#[derive(Debug)]
enum TurnState {
    Idle,
    Turning {
        mv: Move,
        /// Radians swept so far; may overshoot a quarter turn on the last
        /// frame, but the commit clamps.
        angle: f32,
        rate: f32,
        /// Indices into the piece store attached to the pivot.
        slice: Vec<usize>,
    },
}

/// An interactive N×N×N cube.
///
/// The piece store is exclusively owned: hosts read pieces and transforms and
/// submit moves or picks, but only the engine writes coordinates and
/// orientations.
pub struct Cube {
    size: usize,
    pieces: Vec<Piece>,
    queue: VecDeque<Move>,
    history: Vec<Move>,
    turn: TurnState,
    speeds: TurnSpeeds,
    /// Play queued moves at the sequence rate until the queue drains.
    bulk: bool,
    /// Queued moves are a solve playback and must not re-enter the history.
    replaying: bool,
    selection: Option<Selection>,
    /// The move a shown hint points at; committing it pops the history
    /// instead of growing it.
    hinted: Option<Move>,
}

impl Cube {
    pub fn new(size: usize) -> Self {
        assert!(
            (MIN_SIZE..=MAX_SIZE).contains(&size),
            "cube size {} is out of bounds",
            size
        );

        Self {
            size,
            pieces: generate_pieces(size),
            queue: VecDeque::new(),
            history: Vec::new(),
            turn: TurnState::Idle,
            speeds: TurnSpeeds::default(),
            bulk: false,
            replaying: false,
            selection: None,
            hinted: None,
        }
    }

    /// Changes the cube size. Hard reset: pieces, queue, history, and
    /// selection are all discarded and regenerated.
    pub fn set_size(&mut self, size: usize) {
        *self = Self {
            speeds: self.speeds,
            ..Self::new(size)
        };
    }

    pub fn reset(&mut self) {
        self.set_size(self.size);
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Pending moves, including the one currently animating.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self.turn, TurnState::Idle) || !self.queue.is_empty()
    }

    /// Whether every piece is back at its initial position and orientation.
    pub fn is_solved(&self) -> bool {
        self.pieces
            .iter()
            .all(|p| p.coord() == p.initial() && p.orientation() == CubeRotation::default())
    }

    pub fn speeds(&self) -> TurnSpeeds {
        self.speeds
    }

    pub fn set_speeds(&mut self, speeds: TurnSpeeds) {
        self.speeds = speeds;
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Advances the engine by `dt` seconds and returns what happened.
    pub fn tick(&mut self, dt: f32) -> Vec<CubeEvent> {
        let mut events = Vec::new();

        if matches!(self.turn, TurnState::Idle) {
            self.start_next(&mut events);
        }

        if let TurnState::Turning { angle, rate, .. } = &mut self.turn {
            *angle += dt * *rate;
            if *angle >= FRAC_PI_2 {
                self.commit(&mut events);
            }
        }

        events
    }

    /// Submits a single move. Declined while a turn is animating or other
    /// moves are pending; an accepted move consumes the selection.
    pub fn try_move(&mut self, mv: Move) -> bool {
        if self.is_busy() {
            return false;
        }

        self.selection = None;
        self.queue.push_back(mv);
        true
    }

    /// Queues `size` random moves; the shake-to-scramble entry point.
    pub fn shuffle(&mut self) -> bool {
        let count = self.size;
        self.shuffle_n(count)
    }

    /// Queues `count` random moves, played at the sequence rate. No-op while
    /// the engine is busy.
    pub fn shuffle_n(&mut self, count: usize) -> bool {
        if self.is_busy() {
            return false;
        }

        let moves = shuffle_moves(self.size, count, &mut rand::thread_rng());
        log::debug!("scrambling with {} moves", moves.len());
        self.hinted = None;
        self.bulk = true;
        self.queue.extend(moves);
        true
    }

    /// Replaces the queue with the inverse of the history and replays it.
    /// The history is consumed up front: when the playback finishes the cube
    /// is back at its pre-history state with nothing left to undo.
    pub fn solve(&mut self) -> bool {
        if self.is_busy() || self.history.is_empty() {
            return false;
        }

        let moves = solve_moves(&self.history);
        log::debug!("solving back {} moves", moves.len());
        self.history.clear();
        self.hinted = None;
        self.bulk = true;
        self.replaying = true;
        self.queue.extend(moves);
        true
    }

    /// Records a selection from a pointer hit on `piece_id`, with the hit
    /// point in that piece's local frame. An invalid pick (an inward face,
    /// or a face the piece's orientation turned away from the boundary)
    /// clears any existing selection.
    pub fn select(&mut self, piece_id: u32, local: Point3<f32>) -> bool {
        let face = pick_face(local);
        self.selection = self.find_piece(piece_id).and_then(|piece| {
            validate_pick(piece, face, self.size).map(|world| Selection {
                piece: piece_id,
                face,
                world_normal: world,
                coord: piece.coord(),
            })
        });
        self.selection.is_some()
    }

    /// Pure hover query: the face the pointer is over, if it is pickable.
    /// Hosts decide how to render the feedback.
    pub fn hovered_face(&self, piece_id: u32, local: Point3<f32>) -> Option<Face> {
        let face = pick_face(local);
        let piece = self.find_piece(piece_id)?;
        validate_pick(piece, face, self.size).map(|_| face)
    }

    /// Translates a camera-relative swipe on the current selection into a
    /// move and submits it.
    pub fn swipe(&mut self, dir: SwipeDir, camera: &CameraBasis) -> bool {
        if self.is_busy() {
            return false;
        }

        let mv = match &self.selection {
            Some(selection) => match move_for_swipe(selection, dir, camera, self.size) {
                Some(mv) => mv,
                None => return false,
            },
            None => return false,
        };
        self.try_move(mv)
    }

    /// Anchors a directional affordance for undoing the most recent history
    /// entry. Replaces the current selection; inert when there is nothing to
    /// undo.
    pub fn hint(&mut self) -> Option<&Selection> {
        if self.is_busy() {
            return None;
        }

        let target = self.history.last()?.reversed();
        let selection = locate_hint(&self.pieces, target, self.size)?;
        self.hinted = Some(target);
        self.selection = Some(selection);
        self.selection.as_ref()
    }

    /// Per-piece world transforms for rendering, aligned with
    /// [`Self::pieces`]. Pieces in the in-flight slice get the pivot rotation
    /// composed in front of their resting transform; everything else renders
    /// at rest.
    pub fn render_transforms(&self) -> Vec<(Vector3<f32>, Rotation3<f32>)> {
        let mut turning = vec![false; self.pieces.len()];
        let pivot = if let TurnState::Turning {
            mv, angle, slice, ..
        } = &self.turn
        {
            for &i in slice {
                turning[i] = true;
            }
            Rotation3::from_axis_angle(
                &mv.axis.to_unit(),
                mv.direction.to_f32() * angle.min(FRAC_PI_2),
            )
        } else {
            Rotation3::identity()
        };

        self.pieces
            .iter()
            .enumerate()
            .map(|(i, piece)| {
                let rest = piece.orientation().to_rotation3();
                if turning[i] {
                    (pivot * piece.coord(), pivot * rest)
                } else {
                    (piece.coord(), rest)
                }
            })
            .collect()
    }

    fn find_piece(&self, id: u32) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id() == id)
    }

    fn start_next(&mut self, events: &mut Vec<CubeEvent>) {
        while let Some(&mv) = self.queue.front() {
            let slice = select_slice(&self.pieces, mv.axis, mv.layer_coord(self.size));

            if slice.is_empty() {
                // a well-formed move always selects pieces; complete it
                // instantly so the queue cannot deadlock
                log::warn!("move {mv:?} selected no pieces, completing without effect");
                self.queue.pop_front();
                events.push(CubeEvent::MoveCompleted(mv));
                self.finish_if_drained(events);
                continue;
            }

            let rate = if self.bulk {
                self.speeds.sequence
            } else {
                self.speeds.manual
            };
            self.turn = TurnState::Turning {
                mv,
                angle: 0.0,
                rate,
                slice,
            };
            break;
        }
    }

    fn commit(&mut self, events: &mut Vec<CubeEvent>) {
        let state = std::mem::replace(&mut self.turn, TurnState::Idle);
        let TurnState::Turning { mv, slice, .. } = state else {
            return;
        };

        // the overshoot past a quarter turn is discarded: the committed
        // rotation is exactly 90 degrees
        let rotation =
            Rotation3::from_axis_angle(&mv.axis.to_unit(), mv.direction.to_f32() * FRAC_PI_2);

        for &i in &slice {
            let piece = &mut self.pieces[i];
            // run the continuous transform, then keep only its snapped value
            piece.coord = snap_coord(rotation * piece.coord, self.size);
            piece.orientation = CubeRotation::snap(&(rotation * piece.orientation.to_rotation3()));
        }

        self.queue.pop_front();
        self.record(mv);
        self.refresh_selection();
        events.push(CubeEvent::MoveCompleted(mv));
        self.finish_if_drained(events);
    }

    fn record(&mut self, mv: Move) {
        if self.replaying {
            return;
        }

        let hinted = self.hinted.take();
        if hinted == Some(mv) && self.history.last() == Some(&mv.reversed()) {
            self.history.pop();
        } else {
            self.history.push(mv);
        }
    }

    fn finish_if_drained(&mut self, events: &mut Vec<CubeEvent>) {
        if self.queue.is_empty() {
            self.bulk = false;
            self.replaying = false;
            events.push(CubeEvent::SequenceFinished);
        }
    }

    // a selection's cached coordinate goes stale the moment a turn moves its
    // piece; rebuild it from the post-commit state and drop it if its face no
    // longer reaches the boundary
    fn refresh_selection(&mut self) {
        let Some(selection) = self.selection.take() else {
            return;
        };

        self.selection = self
            .pieces
            .iter()
            .find(|p| p.id() == selection.piece)
            .and_then(|piece| {
                validate_pick(piece, selection.face, self.size).map(|world| Selection {
                    world_normal: world,
                    coord: piece.coord(),
                    ..selection
                })
            });
    }
}

/// Pieces whose current coordinate along `axis` lies on the slab at `coord`.
fn select_slice(pieces: &[Piece], axis: Axis, coord: f32) -> Vec<usize> {
    pieces
        .iter()
        .enumerate()
        .filter(|(_, p)| (p.coord()[axis.index()] - coord).abs() <= LAYER_TOL)
        .map(|(i, _)| i)
        .collect()
}
