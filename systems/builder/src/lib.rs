#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure placement system that turns cursor input into highlight and placement commands.

use waypoint_defence_core::{Command, GameState, TileCoord, TowerKind, Vec2};

/// Result of probing the tile grid under the cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileProbe {
    /// Tile the cursor snaps to.
    pub tile: TileCoord,
    /// Indicates whether the grid accepts a tower on the tile.
    pub placeable: bool,
}

/// Declarative placement preview describing a potential tower construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementPreview {
    /// Kind of tower proposed for placement.
    pub kind: TowerKind,
    /// Cursor position in world coordinates.
    pub position: Vec2,
    /// Tile the tower would snap to, if the cursor lies over the grid.
    pub tile: Option<TileCoord>,
    /// Indicates whether the preview represents a valid, affordable placement.
    pub placeable: bool,
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BuilderInput {
    /// Indicates whether the player confirmed a placement on this frame.
    pub confirm_action: bool,
    /// Cursor position in world coordinates.
    pub cursor: Option<Vec2>,
    /// Tower kind being dragged, if any.
    pub kind: Option<TowerKind>,
}

/// Placement system that keeps a single hover highlight in sync with the cursor.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    highlighted: Option<TileCoord>,
    preview: Option<PlacementPreview>,
}

impl Builder {
    /// Creates a new builder system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            highlighted: None,
            preview: None,
        }
    }

    /// Preview computed by the most recent [`Builder::handle`] call.
    #[must_use]
    pub const fn preview(&self) -> Option<PlacementPreview> {
        self.preview
    }

    /// Forgets the current highlight without emitting commands.
    ///
    /// Used after the world cleared its highlights on its own.
    pub fn reset(&mut self) {
        self.highlighted = None;
        self.preview = None;
    }

    /// Consumes the economy snapshot and cursor input to emit builder commands.
    ///
    /// The `probe` closure should mirror the world's tile grid lookup. When it
    /// cannot resolve the cursor the preview falls back to not placeable and
    /// any highlight is cleared.
    pub fn handle<F>(
        &mut self,
        economy: GameState,
        input: BuilderInput,
        mut probe: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(Vec2) -> Option<TileProbe>,
    {
        let (Some(kind), Some(position)) = (input.kind, input.cursor) else {
            self.preview = None;
            self.set_highlight(None, out);
            return;
        };

        if !economy.status().accepts_construction() {
            self.preview = Some(PlacementPreview {
                kind,
                position,
                tile: None,
                placeable: false,
            });
            self.set_highlight(None, out);
            return;
        }

        let probed = probe(position);
        let placeable = probed.is_some_and(|probed| probed.placeable)
            && economy.can_afford(kind.cost());
        let preview = PlacementPreview {
            kind,
            position,
            tile: probed.map(|probed| probed.tile),
            placeable,
        };
        self.preview = Some(preview);

        if !placeable {
            self.set_highlight(None, out);
            return;
        }

        if input.confirm_action {
            self.set_highlight(None, out);
            out.push(Command::PlaceTower { kind, position });
            return;
        }

        self.set_highlight(preview.tile, out);
    }

    fn set_highlight(&mut self, tile: Option<TileCoord>, out: &mut Vec<Command>) {
        if self.highlighted == tile {
            return;
        }
        if self.highlighted.take().is_some() {
            out.push(Command::ClearHighlights);
        }
        if let Some(tile) = tile {
            out.push(Command::HighlightTile { tile });
            self.highlighted = Some(tile);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_is_not_repeated_for_the_same_tile() {
        let mut builder = Builder::new();
        let mut commands = Vec::new();
        let input = BuilderInput {
            cursor: Some(Vec2::new(60.0, 60.0)),
            kind: Some(TowerKind::Archer),
            ..BuilderInput::default()
        };
        let probe = |_| {
            Some(TileProbe {
                tile: TileCoord::new(1, 1),
                placeable: true,
            })
        };

        builder.handle(GameState::new(100, 1), input, probe, &mut commands);
        builder.handle(GameState::new(100, 1), input, probe, &mut commands);

        assert_eq!(
            commands,
            vec![Command::HighlightTile {
                tile: TileCoord::new(1, 1)
            }]
        );
    }
}
