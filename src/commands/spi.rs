//! Bus-level commands: ID, status, raw transfer, busy wait

use ftspi_core::opcodes::{SR_WEL, SR_WIP};
use ftspi_core::SpiInterface;

/// Read and print the JEDEC ID
pub fn run_rdid(spi: &mut dyn SpiInterface) -> Result<(), Box<dyn std::error::Error>> {
    let id = spi.read_jedec_id()?;
    println!("JEDEC ID: {}", hex(&id));

    if id == [0xFF; 3] || id == [0x00; 3] {
        log::warn!("No flash responded (bus reads all {:02X})", id[0]);
    }
    Ok(())
}

/// Read and print status register 1
pub fn run_status(spi: &mut dyn SpiInterface) -> Result<(), Box<dyn std::error::Error>> {
    let sr = spi.read_status()?;
    println!("{}", describe_status(sr));
    Ok(())
}

/// Clock out `write`, then clock in `read` bytes, under one CS window
///
/// The two phases run as one full-duplex transfer; bytes received while
/// writing are discarded.
pub fn run_xfer(
    spi: &mut dyn SpiInterface,
    write: &[u8],
    read: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let received = xfer(spi, write, read)?;
    if !received.is_empty() {
        println!("{}", hex(&received));
    }
    Ok(())
}

/// Poll until `(status & mask) == expected`
pub fn run_wait(
    spi: &mut dyn SpiInterface,
    cmd: u8,
    mask: u8,
    expected: u8,
    max_iterations: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    log::info!(
        "Waiting for (0x{:02X} & 0x{:02X}) == 0x{:02X}, at most {} samples",
        cmd,
        mask,
        expected,
        max_iterations
    );
    spi.spi_wait(cmd, mask, expected, max_iterations)?;
    println!("Condition met");
    Ok(())
}

fn xfer(spi: &mut dyn SpiInterface, write: &[u8], read: usize) -> ftspi_core::Result<Vec<u8>> {
    let len = write.len() + read;
    let mut tx = write.to_vec();
    tx.resize(len, 0xFF);

    if read == 0 {
        spi.spi_put(Some(&tx), None, len)?;
        return Ok(Vec::new());
    }

    let mut rx = vec![0u8; len];
    spi.spi_put(Some(&tx), Some(&mut rx), len)?;
    Ok(rx.split_off(write.len()))
}

fn describe_status(sr: u8) -> String {
    format!(
        "Status: 0x{:02X} (WIP={} WEL={})",
        sr,
        u8::from(sr & SR_WIP != 0),
        u8::from(sr & SR_WEL != 0)
    )
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_status() {
        assert_eq!(describe_status(0x03), "Status: 0x03 (WIP=1 WEL=1)");
        assert_eq!(describe_status(0x00), "Status: 0x00 (WIP=0 WEL=0)");
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(&[0xEF, 0x40, 0x18]), "EF 40 18");
        assert_eq!(hex(&[]), "");
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_xfer_against_dummy() {
        use ftspi_core::{FtdiSpi, SpiConfig};
        use ftspi_dummy::{DummyConfig, DummyMpsse};

        let mut spi = FtdiSpi::new(DummyMpsse::new(DummyConfig::default()), &SpiConfig::default())
            .unwrap();
        assert_eq!(xfer(&mut spi, &[0x9F], 3).unwrap(), vec![0xEF, 0x40, 0x18]);

        // WREN, then status shows WEL
        assert!(xfer(&mut spi, &[0x06], 0).unwrap().is_empty());
        assert_eq!(xfer(&mut spi, &[0x05], 1).unwrap(), vec![SR_WEL]);
        run_wait(&mut spi, 0x05, SR_WIP, 0, 10).unwrap();
    }
}
