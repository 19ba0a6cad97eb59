use std::collections::HashMap;

use eframe::egui::Color32;

use crate::params::MediaType;

/// Identifies one rendered media texture. Scale is not part of the key: it
/// only changes the on-screen size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderKey {
    media_type: MediaType,
    artwork_hash: u64,
    color: [u8; 4],
    opacity: u16,
    output_size: u32,
}

impl RenderKey {
    pub fn new(
        media_type: MediaType,
        artwork_hash: u64,
        color: Color32,
        opacity: f32,
        output_size: usize,
    ) -> Self {
        Self {
            media_type,
            artwork_hash,
            color: color.to_array(),
            opacity: quantize(opacity, 0.001),
            output_size: output_size as u32,
        }
    }
}

/// Bounded cache of rendered media. Every color or opacity edit produces a
/// new key, so the cache is dropped wholesale once it is full.
pub struct RenderCache<V> {
    entries: HashMap<RenderKey, V>,
    capacity: usize,
}

impl<V: Clone> RenderCache<V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &RenderKey) -> Option<V> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: RenderKey, value: V) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.entries.clear();
        }
        self.entries.insert(key, value);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

fn quantize(value: f32, precision: f32) -> u16 {
    let scaled = (value / precision).round();
    scaled.clamp(0.0, u16::MAX as f32) as u16
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn key(opacity: f32) -> RenderKey {
        RenderKey::new(
            MediaType::VinylRecord,
            123,
            Color32::from_rgb(255, 45, 85),
            opacity,
            512,
        )
    }

    #[test]
    fn cache_reuses_entries() {
        let mut cache = RenderCache::with_capacity(4);
        assert!(cache.get(&key(0.5)).is_none());
        let first = Arc::new(1);
        cache.insert(key(0.5), first.clone());
        let second = cache.get(&key(0.5)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn nearly_equal_opacity_shares_a_key() {
        assert_eq!(key(0.5), key(0.5001));
        assert_ne!(key(0.5), key(0.51));
    }

    #[test]
    fn cache_is_bounded() {
        let mut cache = RenderCache::with_capacity(3);
        for step in 0..10 {
            cache.insert(key(step as f32 / 10.0), step);
            assert!(cache.len() <= 3);
        }
    }
}
