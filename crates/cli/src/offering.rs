use regex::Regex;
use saltctl_core::error::SaltError;
use saltctl_core::{CloudProvider, Image, KeyPair, ServiceOffering};

pub const IMAGE_PATTERN: &str = r"^Ubuntu Server 14\.04";
pub const SIZE_NAME: &str = "light.S1";

/// The concrete image, size and keypair new nodes are created with,
/// resolved once per run against the account.
pub struct Offering {
    pub image: Image,
    pub size: ServiceOffering,
    pub keypair: String,
}

pub fn resolve(
    provider: &dyn CloudProvider,
    ssh_key_file: &str,
) -> Result<Offering, Box<dyn std::error::Error>> {
    let image = select_image(&provider.list_images()?, IMAGE_PATTERN)?;
    let size = select_size(&provider.list_sizes()?, SIZE_NAME)?;
    let keypair = select_keypair(&provider.list_key_pairs()?, ssh_key_file)?;
    Ok(Offering {
        image,
        size,
        keypair,
    })
}

/// First image whose name matches the pattern wins; list order is the
/// provider's and is preserved.
pub fn select_image(images: &[Image], pattern: &str) -> Result<Image, SaltError> {
    let re = Regex::new(pattern)
        .map_err(|e| SaltError::from(format!("invalid image pattern '{}': {}", pattern, e)))?;
    images
        .iter()
        .find(|image| re.is_match(&image.name))
        .cloned()
        .ok_or_else(|| SaltError::from(format!("no image matching '{}' is available", pattern)))
}

pub fn select_size(sizes: &[ServiceOffering], name: &str) -> Result<ServiceOffering, SaltError> {
    sizes
        .iter()
        .find(|size| size.name == name)
        .cloned()
        .ok_or_else(|| SaltError::from(format!("no compute size named '{}' is available", name)))
}

pub fn select_keypair(key_pairs: &[KeyPair], name: &str) -> Result<String, SaltError> {
    key_pairs
        .iter()
        .find(|key| key.name == name)
        .map(|key| key.name.clone())
        .ok_or_else(|| {
            SaltError::from(format!(
                "key pair '{}' is not registered with the cloud account",
                name
            ))
        })
}
