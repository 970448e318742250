mod addresses;
mod model_version;
mod profiles;

pub(crate) use addresses::AddressModel;
pub(crate) use model_version::{CURRENT_MODEL_VERSION, ModelVersion};
pub(crate) use profiles::ProfileModel;
