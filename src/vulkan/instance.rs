use std::ffi::{CStr, CString};

use ash::{ext, khr, vk, Entry};
use log::{debug, error, info, warn};
use winit::raw_window_handle::RawDisplayHandle;

use crate::Result;

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

unsafe extern "system" fn vulkan_debug_callback(
    flag: vk::DebugUtilsMessageSeverityFlagsEXT,
    typ: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _: *mut std::ffi::c_void,
) -> vk::Bool32 {
    use vk::DebugUtilsMessageSeverityFlagsEXT as Flag;

    let message = CStr::from_ptr((*p_callback_data).p_message);
    match flag {
        Flag::VERBOSE => debug!("{:?} - {:?}", typ, message),
        Flag::INFO => info!("{:?} - {:?}", typ, message),
        Flag::WARNING => warn!("{:?} - {:?}", typ, message),
        _ => error!("{:?} - {:?}", typ, message),
    }
    vk::FALSE
}

struct DebugMessenger {
    loader: ext::debug_utils::Instance,
    callback: vk::DebugUtilsMessengerEXT,
}

pub struct Instance {
    pub entry: ash::Entry,
    pub inner: ash::Instance,
    debug: Option<DebugMessenger>,
}

impl std::ops::Deref for Instance {
    type Target = ash::Instance;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Instance {
    /// Creates a Vulkan 1.0 instance.
    ///
    /// With a display handle the platform surface extensions are enabled.
    /// Validation is only switched on when the layer is actually installed.
    pub fn new(
        app_name: &str,
        display_handle: Option<RawDisplayHandle>,
        validation: bool,
    ) -> Result<Self> {
        let entry = unsafe { Entry::load() }?;

        let validation = validation && {
            let available = unsafe { entry.enumerate_instance_layer_properties() }?;
            let found = available.iter().any(|layer| {
                (unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) }) == VALIDATION_LAYER
            });
            if !found {
                warn!("{VALIDATION_LAYER:?} requested but not installed, continuing without it");
            }
            found
        };

        let mut layers = vec![];
        let mut extensions = vec![khr::surface::NAME.as_ptr()];
        if let Some(handle) = display_handle {
            extensions = ash_window::enumerate_required_extensions(handle)?.to_vec();
        }
        if validation {
            layers.push(VALIDATION_LAYER.as_ptr());
            extensions.push(ext::debug_utils::NAME.as_ptr());
        }

        #[cfg(any(target_os = "macos", target_os = "ios"))]
        {
            extensions.push(khr::portability_enumeration::NAME.as_ptr());
            extensions.push(khr::get_physical_device_properties2::NAME.as_ptr());
        }

        let create_flags = if cfg!(any(target_os = "macos", target_os = "ios")) {
            vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR
        } else {
            vk::InstanceCreateFlags::default()
        };

        let app_name = CString::new(app_name)?;
        let appinfo = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(1)
            .engine_version(1)
            .api_version(vk::API_VERSION_1_0);
        let instance_info = vk::InstanceCreateInfo::default()
            .application_info(&appinfo)
            .flags(create_flags)
            .enabled_layer_names(&layers)
            .enabled_extension_names(&extensions);
        let inner = unsafe { entry.create_instance(&instance_info, None) }?;

        let debug = if validation {
            let dbg_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                .message_severity(
                    vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                        | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
                )
                .message_type(
                    vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                        | vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                        | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                )
                .pfn_user_callback(Some(vulkan_debug_callback));
            let loader = ext::debug_utils::Instance::new(&entry, &inner);
            let callback = unsafe { loader.create_debug_utils_messenger(&dbg_info, None) }?;
            Some(DebugMessenger { loader, callback })
        } else {
            None
        };
        debug!("Instance created, validation: {validation}");

        Ok(Self {
            entry,
            inner,
            debug,
        })
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        unsafe {
            if let Some(debug) = self.debug.take() {
                debug
                    .loader
                    .destroy_debug_utils_messenger(debug.callback, None);
            }
            self.inner.destroy_instance(None);
        }
    }
}
