//! Conversions between Package and LockedPackage types.

use super::Package;
use crate::json::LockedPackage;

impl From<&LockedPackage> for Package {
    fn from(lp: &LockedPackage) -> Self {
        let mut pkg = Package::new(&lp.name, &lp.version);
        pkg.require = lp.require.clone();
        pkg
    }
}

impl From<LockedPackage> for Package {
    fn from(lp: LockedPackage) -> Self {
        Package::from(&lp)
    }
}

impl From<&Package> for LockedPackage {
    fn from(pkg: &Package) -> Self {
        LockedPackage {
            name: pkg.name.clone(),
            version: pkg.version.clone(),
            require: pkg.require.clone(),
        }
    }
}

impl From<Package> for LockedPackage {
    fn from(pkg: Package) -> Self {
        LockedPackage::from(&pkg)
    }
}
