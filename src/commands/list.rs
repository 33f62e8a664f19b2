//! List command implementation

use crate::programmers;

/// List supported programmers and, with FTDI support, attached cables
pub fn list() -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", programmers::programmer_help());

    #[cfg(feature = "ftdi")]
    {
        println!();
        let devices = ftspi_ftdi::list_devices()?;
        if devices.is_empty() {
            println!("No FTDI devices found");
        } else {
            println!("Attached FTDI devices:");
            for dev in &devices {
                println!("  {}", dev);
            }
        }
    }

    Ok(())
}
