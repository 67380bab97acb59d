//! Accessibility permission check
//!
//! An active CGEventTap on key events only works for processes the user has
//! trusted under Privacy & Security > Accessibility.

/// Where the user grants the permission
pub const GRANT_GUIDANCE: &str =
    "Grant permission in: System Settings → Privacy & Security → Accessibility";

/// Oracle for whether this process may intercept global input events
pub trait CapabilityCheck {
    fn has_interception_capability(&self) -> bool;
}

/// Asks the OS through the Accessibility API
#[derive(Debug, Clone, Copy)]
pub struct AccessibilityCheck {
    /// Show the system dialog that adds this binary to the Accessibility list
    pub prompt: bool,
}

impl AccessibilityCheck {
    pub fn new(prompt: bool) -> Self {
        Self { prompt }
    }
}

#[cfg(target_os = "macos")]
mod ffi {
    use core_foundation::base::TCFType;
    use core_foundation::boolean::CFBoolean;
    use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
    use core_foundation::string::{CFString, CFStringRef};

    #[link(name = "ApplicationServices", kind = "framework")]
    extern "C" {
        fn AXIsProcessTrusted() -> bool;
        fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
        static kAXTrustedCheckOptionPrompt: CFStringRef;
    }

    pub fn is_trusted() -> bool {
        // SAFETY: only reads the trust state of the current process
        unsafe { AXIsProcessTrusted() }
    }

    pub fn is_trusted_with_prompt() -> bool {
        // SAFETY: kAXTrustedCheckOptionPrompt is a constant CFString owned by
        // the framework, so it is wrapped without taking ownership
        let key = unsafe { CFString::wrap_under_get_rule(kAXTrustedCheckOptionPrompt) };
        let options = CFDictionary::from_CFType_pairs(&[(key, CFBoolean::true_value())]);
        unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef()) }
    }
}

impl CapabilityCheck for AccessibilityCheck {
    #[cfg(target_os = "macos")]
    fn has_interception_capability(&self) -> bool {
        let trusted = if self.prompt {
            ffi::is_trusted_with_prompt()
        } else {
            ffi::is_trusted()
        };
        tracing::info!(trusted, prompt = self.prompt, "accessibility permission check");
        trusted
    }

    #[cfg(not(target_os = "macos"))]
    fn has_interception_capability(&self) -> bool {
        tracing::warn!("accessibility permission is only available on macOS");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guidance_names_settings_pane() {
        assert!(GRANT_GUIDANCE.contains("Accessibility"));
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_denied_off_macos() {
        assert!(!AccessibilityCheck::new(false).has_interception_capability());
        assert!(!AccessibilityCheck::new(true).has_interception_capability());
    }
}
