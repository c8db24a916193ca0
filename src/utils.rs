use ash::vk;
use log::warn;

pub fn find_memory_type_index(
    memory_prop: &vk::PhysicalDeviceMemoryProperties,
    memory_type_bits: u32,
    flags: vk::MemoryPropertyFlags,
) -> Option<u32> {
    memory_prop.memory_types[..memory_prop.memory_type_count as _]
        .iter()
        .enumerate()
        .find(|(index, memory_type)| {
            (1 << index) & memory_type_bits != 0 && (memory_type.property_flags & flags) == flags
        })
        .map(|(index, _memory_type)| index as _)
}

/// Caps an enumerated list at `capacity` entries. Dropped entries are reported.
pub fn bounded<T>(mut items: Vec<T>, capacity: usize, what: &str) -> Vec<T> {
    if items.len() > capacity {
        warn!(
            "Found {} {what}, only the first {capacity} will be considered",
            items.len()
        );
        items.truncate(capacity);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_props(flags: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
        let mut props = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: flags.len() as u32,
            ..Default::default()
        };
        for (slot, &property_flags) in props.memory_types.iter_mut().zip(flags) {
            slot.property_flags = property_flags;
        }
        props
    }

    const HOST: vk::MemoryPropertyFlags = vk::MemoryPropertyFlags::from_raw(
        vk::MemoryPropertyFlags::HOST_VISIBLE.as_raw()
            | vk::MemoryPropertyFlags::HOST_COHERENT.as_raw(),
    );

    #[test]
    fn picks_first_host_coherent_type() {
        let props = memory_props(&[
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::MemoryPropertyFlags::HOST_VISIBLE,
            HOST | vk::MemoryPropertyFlags::HOST_CACHED,
            HOST,
        ]);
        assert_eq!(find_memory_type_index(&props, u32::MAX, HOST), Some(2));
    }

    #[test]
    fn respects_requirement_bits() {
        let props = memory_props(&[HOST, vk::MemoryPropertyFlags::DEVICE_LOCAL, HOST]);
        assert_eq!(find_memory_type_index(&props, 0b110, HOST), Some(2));
        assert_eq!(find_memory_type_index(&props, 0b010, HOST), None);
    }

    #[test]
    fn ignores_types_past_the_reported_count() {
        let mut props = memory_props(&[vk::MemoryPropertyFlags::DEVICE_LOCAL]);
        props.memory_types[1].property_flags = HOST;
        assert_eq!(find_memory_type_index(&props, u32::MAX, HOST), None);
    }

    #[test]
    fn bounded_truncates_only_past_capacity() {
        assert_eq!(bounded(vec![1, 2, 3], 10, "items"), vec![1, 2, 3]);
        assert_eq!(bounded(vec![1, 2, 3], 2, "items"), vec![1, 2]);
        assert!(bounded(Vec::<u8>::new(), 0, "items").is_empty());
    }
}
