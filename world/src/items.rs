use stagehop_core::{Aabb, Event, ItemId, ItemKind, ItemSnapshot, Layer, Timestamp, TILE_SIZE};

use crate::{
    body::KinematicBody,
    collision::{CollisionResolver, Landing, VerticalProfile},
    player::{Player, PowerUp},
};

const ITEM_SPEED: f32 = 2.0;
const STAR_BOUNCE: f32 = -10.0;

/// Pickup body plus its kind.
#[derive(Clone, Debug)]
pub(crate) struct Item {
    id: ItemId,
    kind: ItemKind,
    body: KinematicBody,
}

impl Item {
    /// Places an item with its top-left corner at the provided point.
    pub(crate) fn spawn(id: ItemId, kind: ItemKind, x: f32, y: f32, layer: Layer) -> Self {
        let (vx, vy) = match kind {
            ItemKind::Coin | ItemKind::FireFlower => (0.0, 0.0),
            ItemKind::Mushroom => (ITEM_SPEED, 0.0),
            ItemKind::Star => (ITEM_SPEED, STAR_BOUNCE),
        };
        Self {
            id,
            kind,
            body: KinematicBody::new(Aabb::new(x, y, TILE_SIZE, TILE_SIZE), layer)
                .with_velocity(vx, vy),
        }
    }

    pub(crate) const fn is_alive(&self) -> bool {
        self.body.alive
    }

    pub(crate) const fn layer(&self) -> Layer {
        self.body.layer
    }

    /// Moves the item for one tick. Coins never move; fire flowers only fall.
    pub(crate) fn update(&mut self, resolver: &CollisionResolver<'_>) {
        if !self.body.alive {
            return;
        }
        let landing = match self.kind {
            ItemKind::Coin => return,
            ItemKind::FireFlower => Landing::Stop,
            ItemKind::Mushroom => {
                resolver.resolve_patrol(&mut self.body);
                Landing::Stop
            }
            ItemKind::Star => {
                resolver.resolve_patrol(&mut self.body);
                Landing::Rebound(STAR_BOUNCE)
            }
        };
        let _ = resolver.resolve_vertical(&mut self.body, VerticalProfile::falling(landing));
    }

    /// Applies the item's effect on first overlap with the player and consumes it.
    pub(crate) fn touch_player(
        &mut self,
        player: &mut Player,
        now: Timestamp,
        out_events: &mut Vec<Event>,
    ) {
        if !self.body.touches(player.body()) {
            return;
        }
        self.body.kill();
        out_events.push(Event::ItemCollected {
            item: self.id,
            kind: self.kind,
        });
        match self.kind {
            ItemKind::Coin => {
                let total = player.collect_coin();
                out_events.push(Event::CoinsChanged { total });
            }
            ItemKind::Mushroom => player.power_up(PowerUp::Super, now, out_events),
            ItemKind::Star => player.power_up(PowerUp::Star, now, out_events),
            ItemKind::FireFlower => player.power_up(PowerUp::Fire, now, out_events),
        }
    }

    pub(crate) const fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            id: self.id,
            kind: self.kind,
            bounds: self.body.bounds,
            layer: self.body.layer,
        }
    }
}
