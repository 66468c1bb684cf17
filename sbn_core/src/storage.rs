//! On-disc snapshots of a network, tables and evidence included.
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use crate::Net;

impl Net {
    /// Writes a snapshot of this network to `path`, overwriting any previous file.
    pub fn save_to_disc(&self, path: &Path) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, self)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        writer.flush()?;
        log::debug!("saved network `{}` to {}", self.name(), path.display());
        Ok(())
    }

    /// Restores a network previously saved with `save_to_disc`.
    pub fn load_from_disc(path: &Path) -> io::Result<Net> {
        let reader = BufReader::new(File::open(path)?);
        let net: Net = bincode::deserialize_from(reader)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        net.validate()
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        log::debug!("loaded network `{}` from {}", net.name(), path.display());
        Ok(net)
    }
}
