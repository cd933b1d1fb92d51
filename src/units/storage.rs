// Free space of the filesystems holding configured paths, via sysinfo.

use std::path::{Path, PathBuf};

use sysinfo::Disks;

use crate::error::SourceError;
use crate::models::{FreeSpace, Reading};

use super::Sampler;

pub struct FreeSpaceUnit {
    paths: Vec<PathBuf>,
    urgent_below_bytes: u64,
    disks: Disks,
    entries: Vec<FreeSpace>,
}

impl FreeSpaceUnit {
    pub fn new(paths: Vec<PathBuf>, urgent_below_bytes: u64) -> Self {
        let entries = paths
            .iter()
            .map(|path| FreeSpace {
                path: path.clone(),
                available_bytes: 0,
            })
            .collect();
        Self {
            paths,
            urgent_below_bytes,
            disks: Disks::new(),
            entries,
        }
    }
}

/// Available bytes on the mount with the longest mount point that contains
/// `path`, the way statfs resolves an arbitrary path.
pub fn available_for<'a>(
    path: &Path,
    mounts: impl IntoIterator<Item = (&'a Path, u64)>,
) -> Option<u64> {
    mounts
        .into_iter()
        .filter(|(mount, _)| path.starts_with(mount))
        .max_by_key(|(mount, _)| mount.as_os_str().len())
        .map(|(_, available)| available)
}

impl Sampler for FreeSpaceUnit {
    fn sample(&mut self, _tick: u64) -> Result<(), SourceError> {
        self.disks.refresh(true);
        let mut entries = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            let mounts = self
                .disks
                .list()
                .iter()
                .map(|d| (d.mount_point(), d.available_space()));
            let available_bytes = available_for(path, mounts).ok_or_else(|| {
                SourceError::read(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no mounted filesystem"),
                )
            })?;
            entries.push(FreeSpace {
                path: path.clone(),
                available_bytes,
            });
        }
        self.entries = entries;
        Ok(())
    }

    fn reading(&self) -> Reading {
        Reading::FreeSpace {
            entries: self.entries.clone(),
            urgent_below_bytes: self.urgent_below_bytes,
        }
    }
}
