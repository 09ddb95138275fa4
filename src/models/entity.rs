//! Per-submission resolved values

/// Hotel folder used when no hotel name answer is found
pub const UNKNOWN_HOTEL: &str = "Unknown_Hotel";

/// Repeated room blocks on the form
pub const ROOM_INDICES: std::ops::RangeInclusive<usize> = 1..=5;

/// Name and assets resolved for one room index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomSlot {
    /// Raw display name, possibly empty
    pub name: String,
    /// Ordered, deduplicated asset URLs
    pub asset_urls: Vec<String>,
}

/// Everything the classifier bound for one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntity {
    /// Sanitized hotel folder name
    pub hotel: String,
    pub hotel_image_urls: Vec<String>,
    /// Index 0 holds room 1
    pub rooms: [RoomSlot; 5],
}

impl Default for ResolvedEntity {
    fn default() -> Self {
        Self {
            hotel: UNKNOWN_HOTEL.to_string(),
            hotel_image_urls: Vec::new(),
            rooms: Default::default(),
        }
    }
}

impl ResolvedEntity {
    /// Room slot for a 1-based room index
    pub fn room(&self, index: usize) -> Option<&RoomSlot> {
        index.checked_sub(1).and_then(|i| self.rooms.get(i))
    }

    pub fn room_mut(&mut self, index: usize) -> Option<&mut RoomSlot> {
        index.checked_sub(1).and_then(move |i| self.rooms.get_mut(i))
    }
}

/// Append `urls` to `target`, skipping any already present
pub fn extend_unique(target: &mut Vec<String>, urls: impl IntoIterator<Item = String>) {
    for url in urls {
        if !target.contains(&url) {
            target.push(url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_lookup_is_one_based() {
        let mut entity = ResolvedEntity::default();
        entity.room_mut(1).unwrap().name = "Suite".into();
        assert_eq!(entity.rooms[0].name, "Suite");
        assert!(entity.room(0).is_none());
        assert!(entity.room(6).is_none());
        assert_eq!(entity.hotel, UNKNOWN_HOTEL);
    }

    #[test]
    fn test_extend_unique_keeps_first_seen_order() {
        let mut urls = vec!["a".to_string()];
        extend_unique(&mut urls, vec!["b".into(), "a".into(), "c".into(), "b".into()]);
        assert_eq!(urls, vec!["a", "b", "c"]);
    }
}
