use ash::vk;

use crate::{RendererError, Result};

/// Picks one entry out of a non-empty candidate list and returns its index.
pub type SelectFn<T> = fn(&[T]) -> usize;

pub fn take_first<T>(_candidates: &[T]) -> usize {
    0
}

/// Hooks deciding which adapter, queue family and surface format get used.
///
/// Every hook defaults to [`take_first`]. Swapping a hook changes only the
/// choice, never the order of the setup calls around it.
#[derive(Clone, Copy)]
pub struct SelectionPolicy {
    pub adapter: SelectFn<vk::PhysicalDeviceProperties>,
    pub queue_family: SelectFn<vk::QueueFamilyProperties>,
    pub surface_format: SelectFn<vk::SurfaceFormatKHR>,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            adapter: take_first,
            queue_family: take_first,
            surface_format: take_first,
        }
    }
}

impl std::fmt::Debug for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionPolicy").finish_non_exhaustive()
    }
}

/// Runs `hook` over `candidates` and checks the answer.
pub fn select_preferred<T>(
    candidates: &[T],
    hook: SelectFn<T>,
    what: &'static str,
) -> Result<usize> {
    if candidates.is_empty() {
        return Err(RendererError::NoCandidates(what));
    }
    let index = hook(candidates);
    if index >= candidates.len() {
        return Err(RendererError::SelectionOutOfRange {
            what,
            index,
            len: candidates.len(),
        });
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefer_discrete(candidates: &[vk::PhysicalDeviceProperties]) -> usize {
        candidates
            .iter()
            .position(|props| props.device_type == vk::PhysicalDeviceType::DISCRETE_GPU)
            .unwrap_or(0)
    }

    fn adapters(types: &[vk::PhysicalDeviceType]) -> Vec<vk::PhysicalDeviceProperties> {
        types
            .iter()
            .map(|&device_type| vk::PhysicalDeviceProperties {
                device_type,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn default_policy_takes_index_zero() {
        let policy = SelectionPolicy::default();
        let list = adapters(&[
            vk::PhysicalDeviceType::INTEGRATED_GPU,
            vk::PhysicalDeviceType::DISCRETE_GPU,
        ]);
        assert_eq!(select_preferred(&list, policy.adapter, "adapters").unwrap(), 0);

        let formats = [vk::SurfaceFormatKHR::default(); 4];
        assert_eq!(
            select_preferred(&formats, policy.surface_format, "formats").unwrap(),
            0
        );
    }

    #[test]
    fn custom_hook_is_honoured() {
        let list = adapters(&[
            vk::PhysicalDeviceType::CPU,
            vk::PhysicalDeviceType::INTEGRATED_GPU,
            vk::PhysicalDeviceType::DISCRETE_GPU,
        ]);
        assert_eq!(select_preferred(&list, prefer_discrete, "adapters").unwrap(), 2);
    }

    #[test]
    fn empty_candidates_fail() {
        let err = select_preferred::<vk::QueueFamilyProperties>(&[], take_first, "queue families")
            .unwrap_err();
        assert!(matches!(err, RendererError::NoCandidates("queue families")));
    }

    #[test]
    fn out_of_range_answer_fails() {
        let families = [vk::QueueFamilyProperties::default(); 2];
        let err = select_preferred(&families, |_| 5, "queue families").unwrap_err();
        assert!(matches!(
            err,
            RendererError::SelectionOutOfRange {
                index: 5,
                len: 2,
                ..
            }
        ));
    }
}
