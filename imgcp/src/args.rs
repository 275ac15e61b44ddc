// SPDX-License-Identifier: MIT

//! Image registry (`[NAME=]FILE`) and image paths (`[NAME=]/a/b`).

use std::{collections::HashMap, path::PathBuf};

use anyhow::{Context, bail};
use imgfs::{Directory, FsError, Image, fat1216::FatWidth, open_image, parse_path};

/// Image names are uppercase ASCII letters. Unnamed images are numbered.
fn check_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_uppercase())
}

/// Splits `NAME=rest`. `None` when the string carries no name.
fn split_name(spec: &str) -> anyhow::Result<Option<(&str, &str)>> {
    let Some((name, rest)) = spec.split_once('=') else {
        return Ok(None);
    };
    if !check_name(name) || rest.trim().is_empty() {
        bail!("wrong syntax: {spec}");
    }
    Ok(Some((name, rest.trim())))
}

/// The images given on the command line, in order.
#[derive(Debug, Default)]
pub struct ImageSet {
    files: Vec<(String, PathBuf)>,
    unnamed: usize,
}

impl ImageSet {
    pub fn from_specs<S: AsRef<str>>(specs: &[S]) -> anyhow::Result<Self> {
        let mut set = Self::default();
        for spec in specs {
            set.register(spec.as_ref())?;
        }
        Ok(set)
    }

    fn register(&mut self, spec: &str) -> anyhow::Result<()> {
        let (name, file) = match split_name(spec).context("wrong file name syntax")? {
            Some((name, file)) => (name.to_string(), file),
            None => {
                self.unnamed += 1;
                (self.unnamed.to_string(), spec)
            }
        };
        if self.get(&name).is_some() {
            bail!("repeated file name: {name}");
        }
        self.files.push((name, PathBuf::from(file)));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PathBuf> {
        self.files.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PathBuf)> {
        self.files.iter().map(|(n, f)| (n.as_str(), f))
    }

    /// The image a path without `NAME=` refers to: the only image when
    /// exactly one was given, otherwise image "1".
    pub fn default_name(&self) -> String {
        match self.files.as_slice() {
            [(name, _)] => name.clone(),
            _ => "1".to_string(),
        }
    }

    /// Parses `[NAME=]path`.
    pub fn path(&self, arg: &str) -> anyhow::Result<ImgPath> {
        let arg = arg.trim();
        anyhow::ensure!(!arg.is_empty(), "empty path");

        let (image, path) = match split_name(arg).context("wrong syntax for path")? {
            Some((name, path)) => (name.to_string(), path),
            None => (self.default_name(), arg),
        };
        if self.get(&image).is_none() {
            bail!("unknown file name: {image}");
        }

        let (components, is_dir) = parse_path(path)
            .map_err(FsError::Path)
            .with_context(|| format!("wrong syntax for path: {arg}"))?;
        Ok(ImgPath {
            image,
            raw: arg.to_string(),
            components: components.into_iter().map(str::to_string).collect(),
            is_dir,
        })
    }
}

/// A path inside one of the registered images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImgPath {
    pub image: String,
    /// As typed, for messages.
    pub raw: String,
    /// Empty for the root.
    pub components: Vec<String>,
    /// Set by a trailing `/`.
    pub is_dir: bool,
}

impl ImgPath {
    pub fn components(&self) -> Vec<&str> {
        self.components.iter().map(String::as_str).collect()
    }

    pub fn last(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }
}

/// Opened images, shared by every path of a command so that two paths on the
/// same image see one cache.
pub struct Session {
    set: ImageSet,
    width: Option<FatWidth>,
    opened: HashMap<String, Box<dyn Image>>,
}

impl Session {
    pub fn new(set: ImageSet, width: Option<FatWidth>) -> Self {
        Self {
            set,
            width,
            opened: HashMap::new(),
        }
    }

    pub fn images(&self) -> &ImageSet {
        &self.set
    }

    pub fn path(&self, arg: &str) -> anyhow::Result<ImgPath> {
        self.set.path(arg)
    }

    /// Forced table width, if any.
    pub fn width(&self) -> Option<FatWidth> {
        self.width
    }

    pub fn image(&mut self, name: &str) -> anyhow::Result<&dyn Image> {
        if !self.opened.contains_key(name) {
            let file = self
                .set
                .get(name)
                .with_context(|| format!("unknown file name: {name}"))?;
            let img = open_image(file, self.width)
                .with_context(|| format!("cannot open image {}", file.display()))?;
            log::debug!("image {name} opened from {}", file.display());
            self.opened.insert(name.to_string(), img);
        }
        match self.opened.get(name) {
            Some(img) => Ok(img.as_ref()),
            None => bail!("unknown file name: {name}"),
        }
    }

    pub fn root(&mut self, name: &str) -> anyhow::Result<Box<dyn Directory>> {
        Ok(self.image(name)?.root_directory()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_names() {
        let set = ImageSet::from_specs(&["a.img", "HD=b.img", "c"]).unwrap();
        let names: Vec<_> = set.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["1", "HD", "2"]);
        assert_eq!(set.get("HD").unwrap(), &PathBuf::from("b.img"));

        assert!(ImageSet::from_specs(&["A=x", "A=y"]).is_err());
        assert!(ImageSet::from_specs(&["lower=x"]).is_err());
        assert!(ImageSet::from_specs(&["=x"]).is_err());
        assert!(ImageSet::from_specs(&["A="]).is_err());
    }

    #[test]
    fn test_paths() {
        let set = ImageSet::from_specs(&["a.img", "HD=b.img"]).unwrap();

        let p = set.path("HD=/DOCS/README.TXT").unwrap();
        assert_eq!(p.image, "HD");
        assert_eq!(p.components, ["DOCS", "README.TXT"]);
        assert!(!p.is_dir);

        let p = set.path("/DOCS/").unwrap();
        assert_eq!(p.image, "1");
        assert!(p.is_dir);

        let p = set.path("HD=/").unwrap();
        assert!(p.components.is_empty() && p.is_dir);

        assert!(set.path("X=/a").is_err());
        assert!(set.path("HD=/a//b").is_err());
        assert!(set.path("  ").is_err());
    }

    #[test]
    fn test_single_named_image_is_default() {
        let set = ImageSet::from_specs(&["HD=b.img"]).unwrap();
        assert_eq!(set.path("/X").unwrap().image, "HD");
    }
}
