use crate::bridge::exports::Engine;
use crate::bridge::marshal::NativeDeviceList;
use crate::models::error::RecorderError;

impl Engine {
    /// Names of the available input devices, in device-index order.
    ///
    /// Independent of any session. An engine failure is returned as an
    /// error, never as an empty list.
    pub fn available_devices(&self) -> Result<Vec<String>, RecorderError> {
        let table = self.table();
        let list = NativeDeviceList::fetch(table.get_available_devices, table.free_available_devices)?;
        list.to_names()
    }
}
