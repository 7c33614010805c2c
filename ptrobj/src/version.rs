pub const PTO_VERSION: u32 = ptrobj_sys::PTO_VERSION;
pub const PTO_VERSION_MAJOR: u32 = ptrobj_sys::PTO_VERSION_MAJOR;
pub const PTO_VERSION_MINOR: u32 = ptrobj_sys::PTO_VERSION_MINOR;
pub const PTO_VERSION_PATCH: u32 = ptrobj_sys::PTO_VERSION_PATCH;

/// The version of the native library API.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    const MAJOR_MAX: u32 = 0xffff;
    const MINOR_MAX: u32 = 0xff;
    const PATCH_MAX: u32 = 0xff;
}

/// Packs the version as `major << 16 | minor << 8 | patch`.
///
/// Fails with the version itself if a field does not fit its slot.
impl TryFrom<Version> for u32 {
    type Error = Version;

    fn try_from(version: Version) -> Result<Self, Self::Error> {
        if version.major > Version::MAJOR_MAX
            || version.minor > Version::MINOR_MAX
            || version.patch > Version::PATCH_MAX
        {
            return Err(version);
        }

        Ok((version.major << 16) | (version.minor << 8) | version.patch)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self {
            major: PTO_VERSION_MAJOR,
            minor: PTO_VERSION_MINOR,
            patch: PTO_VERSION_PATCH,
        }
    }
}

/// The version string reported by the linked native library.
pub fn native_version() -> String {
    let ptr = ptrobj_sys::ptoGetVersion();
    if ptr.is_null() {
        return String::new();
    }
    unsafe { std::ffi::CStr::from_ptr(ptr) }
        .to_string_lossy()
        .into_owned()
}
