#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::Arc;
use wiring::{
    Binding, ConstructorInfo, DescriptorBuilder, Disposable, Initializable, MemberInfo, MethodInfo, ParameterInfo,
    Startable, TypeCatalog, TypeDescriptor,
};

pub trait Weapon: Send + Sync {
    fn hit(&self, target: &str) -> String;
}

pub type WeaponRef = Arc<dyn Weapon>;

#[derive(Default)]
pub struct Sword;

impl Weapon for Sword {
    fn hit(&self, target: &str) -> String {
        format!("Chopped {target} clean in half")
    }
}

#[derive(Default)]
pub struct Shuriken;

impl Weapon for Shuriken {
    fn hit(&self, target: &str) -> String {
        format!("Pierced {target}'s armor")
    }
}

#[derive(Default)]
pub struct Dagger;

impl Weapon for Dagger {
    fn hit(&self, target: &str) -> String {
        format!("Stabbed {target}")
    }
}

pub struct Samurai {
    pub weapon: WeaponRef,
}

impl Samurai {
    pub fn attack(&self, target: &str) -> String {
        self.weapon.hit(target)
    }
}

pub struct Ninja {
    pub weapon: WeaponRef,
}

/// Warrior whose weapons are picked by tag.
pub struct Armory {
    pub primary: WeaponRef,
    pub secondary: WeaponRef,
    pub spare: WeaponRef,
}

pub fn weapon<I: Weapon + Default + 'static>() -> Binding {
    Binding::to::<WeaponRef, I>(|weapon| weapon)
}

pub fn catalog() -> TypeCatalog {
    TypeCatalog::new()
        .with(TypeDescriptor::builder::<Sword>().default_constructor().build())
        .with(TypeDescriptor::builder::<Shuriken>().default_constructor().build())
        .with(TypeDescriptor::builder::<Dagger>().default_constructor().build())
        .with(
            TypeDescriptor::builder::<Samurai>()
                .constructor(
                    ConstructorInfo::of(|arguments| {
                        Ok(Samurai {
                            weapon: arguments.cloned::<WeaponRef>(0)?,
                        })
                    })
                    .parameter::<WeaponRef>("weapon"),
                )
                .build(),
        )
        .with(
            TypeDescriptor::builder::<Ninja>()
                .constructor(
                    ConstructorInfo::of(|arguments| {
                        Ok(Ninja {
                            weapon: arguments.cloned::<WeaponRef>(0)?,
                        })
                    })
                    .parameter::<WeaponRef>("weapon"),
                )
                .build(),
        )
        .with(
            TypeDescriptor::builder::<Armory>()
                .constructor(
                    ConstructorInfo::of(|arguments| {
                        Ok(Armory {
                            primary: arguments.cloned::<WeaponRef>(0)?,
                            secondary: arguments.cloned::<WeaponRef>(1)?,
                            spare: arguments.cloned::<WeaponRef>(2)?,
                        })
                    })
                    .with_parameter(ParameterInfo::of::<WeaponRef>("primary").tagged("A"))
                    .with_parameter(ParameterInfo::of::<WeaponRef>("secondary").tagged("B"))
                    .parameter::<WeaponRef>("spare"),
                )
                .build(),
        )
}

/// Records lifecycle events in order.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn write(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

/// Disposable resource remembering its name and the journal it writes to.
pub struct Lantern {
    pub name: Mutex<String>,
    pub journal: Arc<Journal>,
}

impl Initializable for Lantern {
    fn initialize(&self) -> anyhow::Result<()> {
        self.journal.write(format!("initialize {}", self.name.lock()));
        Ok(())
    }
}

impl Startable for Lantern {
    fn start(&self) -> anyhow::Result<()> {
        self.journal.write(format!("start {}", self.name.lock()));
        Ok(())
    }

    fn stop(&self) -> anyhow::Result<()> {
        self.journal.write(format!("stop {}", self.name.lock()));
        Ok(())
    }
}

impl Disposable for Lantern {
    fn dispose(&self) -> anyhow::Result<()> {
        self.journal.write(format!("dispose {}", self.name.lock()));
        Ok(())
    }
}

/// Lantern named through the `name` property and lit through the `light` method.
pub fn lantern_descriptor() -> TypeDescriptor {
    lantern().build()
}

pub fn lantern() -> DescriptorBuilder<Lantern> {
    TypeDescriptor::builder::<Lantern>()
        .constructor(
            ConstructorInfo::of(|arguments| {
                Ok(Lantern {
                    name: Mutex::new(String::from("unnamed")),
                    journal: arguments.get::<Journal>(0)?,
                })
            })
            .parameter::<Journal>("journal"),
        )
        .property(
            MemberInfo::of::<Lantern, String, _>("name", |lantern, name| {
                *lantern.name.lock() = (*name).clone();
                Ok(())
            })
            .injectable()
            .optional(),
        )
        .method(
            MethodInfo::of::<Lantern, _>("light", |lantern, arguments| {
                let color = arguments.cloned::<&'static str>(0)?;
                lantern.journal.write(format!("light {} {color}", lantern.name.lock()));
                Ok(())
            })
            .parameter::<&'static str>("color")
            .injectable(),
        )
        .initializable()
        .startable()
        .disposable()
}
